use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use ethers::types::TxHash;

use bvote::client::contract::parse_address;
use bvote::client::render::party_cards_html;
use bvote::client::{AdminClient, ApiClient, LoginOutcome, Tally, View, VoterClient};

#[derive(Parser)]
#[command(name = "bvote", about = "Vote through the BVote contract")]
struct Cli {
    /// Base URL of the bvote API server
    #[arg(long, env = "BVOTE_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Print HTML fragments instead of text
    #[arg(long)]
    html: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a voter on chain through their constituency relayer
    Register {
        #[arg(long)]
        voter_id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        constituency: i64,
    },
    /// Log in and show the ballot, or the vote already cast
    Login {
        #[arg(long)]
        voter_id: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and cast a vote
    Vote {
        #[arg(long)]
        voter_id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        party: u64,
    },
    /// End a voter's on-chain session
    Logout {
        #[arg(long)]
        voter_id: String,
    },
    /// Admin actions, sent from the node's first account
    Admin {
        #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
        rpc_url: String,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    RegisterParty {
        #[arg(long)]
        number: u64,
        #[arg(long)]
        name: String,
    },
    RegisterVoter {
        #[arg(long)]
        voter_id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        constituency: u64,
    },
    SetAdmin {
        #[arg(long)]
        address: String,
    },
    SetRelayer {
        #[arg(long)]
        constituency: u64,
        #[arg(long)]
        address: String,
    },
    /// Overall vote count per party
    Results,
    /// One party's votes in each constituency
    PartyVotes {
        #[arg(long)]
        party: u64,
        /// Number of constituencies; defaults to the party count
        #[arg(long)]
        constituencies: Option<u64>,
    },
    /// Every party's votes in one constituency
    ConstituencyVotes {
        #[arg(long)]
        constituency: u64,
    },
}

fn show_view(view: &View, html: bool) {
    if html {
        print!("{}", view.to_html());
    } else {
        print!("{view}");
    }
}

fn show_tally(tally: &Tally, html: bool) {
    if html {
        print!("{}", tally.to_html());
    } else {
        print!("{tally}");
    }
}

fn done(action: &str, tx: TxHash) {
    println!("{action} successfully ({tx:?})");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server);

    match cli.command {
        Command::Register {
            voter_id,
            password,
            constituency,
        } => {
            let view = VoterClient::new(api)
                .register_voter(&voter_id, &password, constituency)
                .await?;
            show_view(&view, cli.html);
        }
        Command::Login { voter_id, password } => {
            let outcome = VoterClient::new(api).login_voter(&voter_id, &password).await?;
            show_view(outcome.view(), cli.html);
        }
        Command::Vote {
            voter_id,
            password,
            party,
        } => match VoterClient::new(api).login_voter(&voter_id, &password).await? {
            LoginOutcome::Failed(view) => show_view(&view, cli.html),
            LoginOutcome::LoggedIn { view: view @ View::Voted { .. }, .. } => {
                show_view(&view, cli.html)
            }
            LoginOutcome::LoggedIn { session, .. } => {
                let view = session.vote(party).await.context("Error voting")?;
                show_view(&view, cli.html);
            }
        },
        Command::Logout { voter_id } => {
            let session = VoterClient::new(api).session(&voter_id).await?;
            let view = session.logout().await.context("Error logging out")?;
            show_view(&view, cli.html);
        }
        Command::Admin { rpc_url, action } => {
            let admin = AdminClient::connect(&api, &rpc_url)
                .await
                .context("Please connect to the local development network")?;
            run_admin(&admin, action, cli.html).await?;
        }
    }

    Ok(())
}

async fn run_admin(admin: &AdminClient, action: AdminAction, html: bool) -> anyhow::Result<()> {
    match action {
        AdminAction::RegisterParty { number, name } => {
            let tx = admin
                .register_party(number, &name)
                .await
                .context("Error registering party")?;
            done("Party registered", tx);
        }
        AdminAction::RegisterVoter {
            voter_id,
            password,
            constituency,
        } => {
            let tx = admin
                .register_voter(&voter_id, &password, constituency)
                .await
                .context("Error registering voter")?;
            done("Voter registered", tx);
        }
        AdminAction::SetAdmin { address } => {
            let tx = admin
                .set_admin(parse_address(&address)?)
                .await
                .context("Error setting admin")?;
            done("Admin set", tx);
        }
        AdminAction::SetRelayer {
            constituency,
            address,
        } => {
            let tx = admin
                .set_relayer(constituency, parse_address(&address)?)
                .await
                .context("Error setting relayer")?;
            done("Relayer set", tx);
        }
        AdminAction::Results => {
            let parties = admin.results().await.context("Error fetching results")?;
            if html {
                print!("{}", party_cards_html(&parties));
            } else {
                for party in &parties {
                    println!("[{}] {}: {} votes", party.number, party.name, party.vote_count);
                }
            }
        }
        AdminAction::PartyVotes {
            party,
            constituencies,
        } => {
            let tally = admin
                .party_votes_by_constituency(party, constituencies)
                .await
                .context("Error fetching votes by constituency")?;
            show_tally(&tally, html);
        }
        AdminAction::ConstituencyVotes { constituency } => {
            let tally = admin
                .votes_by_constituency(constituency)
                .await
                .context("Error fetching votes by constituency")?;
            show_tally(&tally, html);
        }
    }

    Ok(())
}
