use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    bigip-explode completions bash > ~/.bash_completion.d/bigip-explode\n\n\
                  Generate zsh completions:\n    bigip-explode completions zsh > ~/.zfunc/_bigip-explode\n\n\
                  Generate fish completions:\n    bigip-explode completions fish > ~/.config/fish/completions/bigip-explode.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
