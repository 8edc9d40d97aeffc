//! SFTP-only `Match Group` block for `sshd_config`

use regex::escape;

use super::BlockSpec;
use crate::error::Result;

/// Block that jails members of `group` into internal-sftp
///
/// The block ends at the next `Match` line, the same way sshd reads it.
pub fn sftp_block(group: &str, chroot: bool) -> Result<BlockSpec> {
    // sshd keywords are case-insensitive, group names are not
    let start = format!(r"^\s*(?i:match)\s+(?i:group)\s+{}\s*$", escape(group));
    let end = r"^\s*(?i:match)\s";

    let mut body = vec![format!("Match Group {group}")];
    if chroot {
        body.push("    ChrootDirectory %h".to_string());
    }
    body.extend(
        [
            "    ForceCommand internal-sftp",
            "    AllowTcpForwarding no",
            "    X11Forwarding no",
        ]
        .map(String::from),
    );

    BlockSpec::new(&start, end, body)
}
