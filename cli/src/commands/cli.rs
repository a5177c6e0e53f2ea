use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "yunwei", version, about = "智能运维助手")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.yunwei/config.toml then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Print machine-readable JSON instead of the rendered reply.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask one question and exit.
    Ask {
        #[arg(long)]
        session: Option<String>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Interactive session. Lines starting with `/` are console commands.
    Repl {
        #[arg(long)]
        session: Option<String>,
    },
    /// Run a system check, then review its fix plans.
    Plans {
        #[arg(long, default_value = "检查系统")]
        query: String,
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Run a query and print the resulting session state.
    State {
        #[arg(long, default_value = "检查系统")]
        query: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    List,
    Approve {
        plan_id: String,
        /// Actually execute the plan's commands on this host.
        #[arg(long)]
        yes: bool,
    },
    Reject {
        plan_id: String,
    },
    Edit {
        plan_id: String,
        index: usize,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}
