//! Command-line surface of the console.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fraud-console",
    version,
    about = "Terminal console for the document fraud-detection platform",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the hosted sign-in URL
    LoginUrl,
    /// Print the hosted sign-up URL
    SignupUrl,
    /// Print the hosted password-reset URL
    ForgotPasswordUrl,
    /// Exchange the authorization code from the sign-in redirect for a session
    SignIn {
        #[arg(long)]
        code: String,
    },
    /// End the session and print the provider's logout URL
    SignOut,
    /// Show the landing page (guest links when signed out)
    Dashboard,
    /// Single-shot document analysis
    #[command(subcommand)]
    Documents(DocumentsCommand),
    /// Run an interactive agent verification for an image
    Verify(VerifyArgs),
    /// Manage prompt templates
    #[command(subcommand)]
    Prompts(PromptsCommand),
    /// Manage model and inference configuration
    #[command(subcommand)]
    Configs(ConfigsCommand),
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommand {
    /// List analyzed documents
    List,
    /// Analyze a JPEG or PNG image
    Analyze {
        #[arg(value_name = "IMAGE")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JPEG or PNG image of the document
    #[arg(value_name = "IMAGE")]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct PromptFields {
    #[arg(long)]
    pub role: String,

    #[arg(long)]
    pub tasks: String,

    #[arg(long)]
    pub active: bool,
}

#[derive(Subcommand, Debug)]
pub enum PromptsCommand {
    List,
    /// Preview a single prompt
    Show { id: String },
    Create(PromptFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: PromptFields,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigsCommand {
    List,
    /// Change the value of an entry
    Set {
        /// MODEL_IDS or INFERENCE_PARAMS
        #[arg(long)]
        group: String,
        key: String,
        value: String,
    },
    /// Make a model the only active one
    Activate { key: String },
}
