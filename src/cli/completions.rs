use clap::Parser;
use clap_complete::Shell;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    hostprov completions bash > /etc/bash_completion.d/hostprov\n\n\
                  Generate zsh completions:\n    hostprov completions zsh > ~/.zfunc/_hostprov\n\n\
                  Generate fish completions:\n    hostprov completions fish > ~/.config/fish/completions/hostprov.fish")]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
