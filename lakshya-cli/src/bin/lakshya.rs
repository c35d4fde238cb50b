use lakshya_cli::*;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use colored_json::to_colored_json_auto;
use lakshya::api::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use lakshya::api::roadmap::CourseStatus;
use lakshya::api::users::{
    OnboardingRequest, PreferenceCreate, UserSkillCreate, UserSkillUpdate, UserUpdate,
};
use log::{self, debug};
use std::io::Write;
use structopt::StructOpt;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(StructOpt)]
#[structopt(
    rename_all = "kebab-case",
    about = "CLI interface for the LakshyaSetu career guidance API"
)]
struct Opt {
    #[structopt(
        global = true,
        long = "--api-url",
        env = "LAKSHYA_API_URL",
        default_value = "http://localhost:8000/api"
    )]
    api_url: String,

    /// Where the session (tokens and user) is kept between runs
    #[structopt(
        global = true,
        long = "--session-file",
        env = "LAKSHYA_SESSION_FILE",
        parse(from_os_str)
    )]
    session_file: Option<PathBuf>,

    /// Log more messages. Pass multiple times for ever more verbosity
    ///
    /// By default, it'll only report errors. Passing `-v` one time also prints
    /// warnings, `-vv` enables info logging, `-vvv` debug, and `-vvvv` trace.
    #[structopt(global = true, long, short = "v", parse(from_occurrences))]
    verbose: i8,

    #[structopt(long = "--shell-completions", hidden = true)]
    shell_completions: Option<structopt::clap::Shell>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum AccountCommand {
    /// Register a new account, and sign in to it
    Register {
        #[structopt(long, short)]
        name: String,

        #[structopt(long, short)]
        email: String,

        #[structopt(long, short, env = "LAKSHYA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Login {
        #[structopt(long, short)]
        email: String,

        #[structopt(long, short, env = "LAKSHYA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the local session
    Logout,
    /// Show the signed-in user, as the server sees it
    Whoami,
    ChangePassword {
        #[structopt(long)]
        current: String,

        #[structopt(long)]
        new: String,
    },
    /// Exchange the refresh token for a new session right away
    Refresh,
}

#[derive(StructOpt)]
enum ProfileCommand {
    /// Profile with skills and preferences
    Show,
    Update {
        #[structopt(long)]
        name: Option<String>,

        #[structopt(long)]
        education: Option<String>,

        #[structopt(long)]
        role: Option<String>,
    },
    Onboard {
        #[structopt(long)]
        education: String,

        #[structopt(long = "skill")]
        skills: Vec<String>,

        #[structopt(long = "interest")]
        interests: Vec<String>,

        #[structopt(long = "goal")]
        goals: Vec<String>,
    },
}

#[derive(StructOpt)]
enum SkillsCommand {
    List,
    Add {
        name: String,
        /// 0 to 100
        proficiency: f64,
    },
    Update {
        id: i64,

        #[structopt(long)]
        name: Option<String>,

        #[structopt(long)]
        proficiency: Option<f64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(StructOpt)]
enum PreferencesCommand {
    List,
    Add {
        #[structopt(long)]
        interest: Option<String>,

        #[structopt(long)]
        goal: Option<String>,
    },
}

#[derive(StructOpt)]
enum CareersCommand {
    Matches {
        /// Print raw JSON instead of a summary
        #[structopt(long)]
        json: bool,
    },
    Match {
        id: i64,
    },
    Readiness,
    Dashboard,
    Trends,
    Activity,
}

#[derive(StructOpt)]
enum GapsCommand {
    Analysis,
    List,
    Priority,
}

#[derive(StructOpt)]
enum RoadmapCommand {
    Show {
        /// Print raw JSON instead of a summary
        #[structopt(long)]
        json: bool,
    },
    Recommended,
    /// Record progress on a course
    Progress {
        course_id: i64,
        /// 0 to 100
        progress: f64,

        /// not-started, in-progress, completed, or locked
        #[structopt(long, default_value = "in-progress")]
        status: CourseStatus,
    },
}

#[derive(StructOpt)]
enum InterviewCommand {
    Questions,
    Question { id: i64 },
    Categories,
    Category { name: String },
    Stats,
}

#[derive(StructOpt)]
enum Command {
    /// Sub-commands for managing account and session
    Account {
        #[structopt(subcommand)]
        cmd: AccountCommand,
    },

    Profile {
        #[structopt(subcommand)]
        cmd: ProfileCommand,
    },

    Skills {
        #[structopt(subcommand)]
        cmd: SkillsCommand,
    },

    Preferences {
        #[structopt(subcommand)]
        cmd: PreferencesCommand,
    },

    Careers {
        #[structopt(subcommand)]
        cmd: CareersCommand,
    },

    /// Skill gap analysis
    Gaps {
        #[structopt(subcommand)]
        cmd: GapsCommand,
    },

    Roadmap {
        #[structopt(subcommand)]
        cmd: RoadmapCommand,
    },

    Interview {
        #[structopt(subcommand)]
        cmd: InterviewCommand,
    },

    /// Ask the career assistant
    Chat {
        #[structopt(required = true)]
        message: Vec<String>,
    },

    /// Raw API call through the session pipeline, eg `request put users/skills/3 proficiency=80`
    Request {
        method: String,
        endpoint: String,
        fields: Vec<ArgField>,
    },

    /// Summarize configuration and session
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let opt = Opt::from_args();

    let log_level = match opt.verbose {
        std::i8::MIN..=-1 => "none",
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        4..=std::i8::MAX => "trace",
    };
    // hyper logging is very verbose, so crank that down even if everything else is more verbose
    let log_filter = format!("{},hyper=error,reqwest=error", log_level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter))
        .format_timestamp(None)
        .init();

    debug!("Args parsed, starting up");

    #[cfg(windows)]
    colored_json::enable_ansi_support();

    if let Some(shell) = opt.shell_completions {
        Opt::clap().gen_completions_to("lakshya", shell, &mut std::io::stdout());
        std::process::exit(0);
    }

    if let Err(err) = run(opt).await {
        // Be graceful about some errors
        if let Some(io_err) = err.root_cause().downcast_ref::<std::io::Error>() {
            if let std::io::ErrorKind::BrokenPipe = io_err.kind() {
                // presumably due to something like writing to stdout and piped to `head -n10` and
                // stdout was closed
                debug!("got BrokenPipe error, assuming stdout closed as expected and exiting with success");
                std::process::exit(0);
            }
        }
        let mut color_stderr = StandardStream::stderr(if atty::is(atty::Stream::Stderr) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        });
        color_stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        eprintln!("Error: {:?}", err);
        color_stderr.set_color(&ColorSpec::new())?;
        std::process::exit(1);
    }
    Ok(())
}

fn print_result_json(result: Option<Value>) -> Result<()> {
    if let Some(val) = result {
        writeln!(&mut std::io::stdout(), "{}", to_colored_json_auto(&val)?)?
    };
    Ok(())
}

fn to_json<T: Serialize>(record: &T) -> Result<Option<Value>> {
    Ok(Some(serde_json::to_value(record)?))
}

fn session_expired_notice() {
    let mut color_stderr = StandardStream::stderr(if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    });
    color_stderr
        .set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))
        .ok();
    eprintln!("session expired, please log in again");
    color_stderr.reset().ok();
}

fn print_status(client: &ApiClient, session_path: &std::path::Path) -> Result<()> {
    println!("Configuration");
    println!("  LAKSHYA_API_URL: {}", client.base_url());
    println!("  LAKSHYA_SESSION_FILE: {}", session_path.display());

    println!("Session");
    for line in session_summary(client.session()) {
        println!("  {}", line);
    }
    Ok(())
}

async fn run(opt: Opt) -> Result<()> {
    let session_path = opt
        .session_file
        .clone()
        .unwrap_or_else(default_session_path);
    let config = ClientConfig {
        timeout: ClientConfig::from_env()?.timeout,
        ..ClientConfig::new(&opt.api_url)
    };
    let client = ApiClient::new(&config, SessionStore::open(&session_path))?
        .on_unauthenticated(session_expired_notice);

    let result = match opt.cmd {
        Command::Status => {
            print_status(&client, &session_path)?;
            None
        }
        Command::Account {
            cmd:
                AccountCommand::Register {
                    name,
                    email,
                    password,
                },
        } => {
            let tokens = client
                .register(&RegisterRequest {
                    name,
                    email,
                    password,
                })
                .await?;
            to_json(&tokens.user)?
        }
        Command::Account {
            cmd: AccountCommand::Login { email, password },
        } => {
            let tokens = client.login(&LoginRequest { email, password }).await?;
            to_json(&tokens.user)?
        }
        Command::Account {
            cmd: AccountCommand::Logout,
        } => {
            client.logout()?;
            None
        }
        Command::Account {
            cmd: AccountCommand::Whoami,
        } => to_json(&client.current_user().await?)?,
        Command::Account {
            cmd: AccountCommand::ChangePassword { current, new },
        } => to_json(
            &client
                .change_password(&ChangePasswordRequest {
                    current_password: current,
                    new_password: new,
                })
                .await?,
        )?,
        Command::Account {
            cmd: AccountCommand::Refresh,
        } => {
            client.refresh_session().await?;
            to_json(&client.session().user())?
        }
        Command::Profile {
            cmd: ProfileCommand::Show,
        } => to_json(&client.profile().await?)?,
        Command::Profile {
            cmd:
                ProfileCommand::Update {
                    name,
                    education,
                    role,
                },
        } => to_json(
            &client
                .update_profile(&UserUpdate {
                    name,
                    education,
                    role,
                })
                .await?,
        )?,
        Command::Profile {
            cmd:
                ProfileCommand::Onboard {
                    education,
                    skills,
                    interests,
                    goals,
                },
        } => to_json(
            &client
                .complete_onboarding(&OnboardingRequest {
                    education,
                    skills,
                    interests,
                    goals,
                })
                .await?,
        )?,
        Command::Skills {
            cmd: SkillsCommand::List,
        } => to_json(&client.skills().await?)?,
        Command::Skills {
            cmd: SkillsCommand::Add { name, proficiency },
        } => to_json(
            &client
                .add_skill(&UserSkillCreate {
                    skill_name: name,
                    proficiency,
                })
                .await?,
        )?,
        Command::Skills {
            cmd:
                SkillsCommand::Update {
                    id,
                    name,
                    proficiency,
                },
        } => to_json(
            &client
                .update_skill(
                    id,
                    &UserSkillUpdate {
                        skill_name: name,
                        proficiency,
                    },
                )
                .await?,
        )?,
        Command::Skills {
            cmd: SkillsCommand::Delete { id },
        } => {
            client.delete_skill(id).await?;
            None
        }
        Command::Preferences {
            cmd: PreferencesCommand::List,
        } => to_json(&client.preferences().await?)?,
        Command::Preferences {
            cmd: PreferencesCommand::Add { interest, goal },
        } => to_json(
            &client
                .add_preference(&PreferenceCreate { interest, goal })
                .await?,
        )?,
        Command::Careers {
            cmd: CareersCommand::Matches { json },
        } => {
            let matches = client.career_matches().await?;
            if json {
                to_json(&matches)?
            } else {
                pretty::pp_career_matches(&matches)?;
                None
            }
        }
        Command::Careers {
            cmd: CareersCommand::Match { id },
        } => to_json(&client.career_match(id).await?)?,
        Command::Careers {
            cmd: CareersCommand::Readiness,
        } => to_json(&client.readiness_score().await?)?,
        Command::Careers {
            cmd: CareersCommand::Dashboard,
        } => to_json(&client.dashboard_stats().await?)?,
        Command::Careers {
            cmd: CareersCommand::Trends,
        } => to_json(&client.career_trends().await?)?,
        Command::Careers {
            cmd: CareersCommand::Activity,
        } => to_json(&client.activity().await?)?,
        Command::Gaps {
            cmd: GapsCommand::Analysis,
        } => to_json(&client.skill_analysis().await?)?,
        Command::Gaps {
            cmd: GapsCommand::List,
        } => to_json(&client.skill_gaps().await?)?,
        Command::Gaps {
            cmd: GapsCommand::Priority,
        } => to_json(&client.priority_skills().await?)?,
        Command::Roadmap {
            cmd: RoadmapCommand::Show { json },
        } => {
            let roadmap = client.learning_roadmap().await?;
            if json {
                to_json(&roadmap)?
            } else {
                pretty::pp_roadmap(&roadmap)?;
                None
            }
        }
        Command::Roadmap {
            cmd: RoadmapCommand::Recommended,
        } => to_json(&client.recommended_courses().await?)?,
        Command::Roadmap {
            cmd:
                RoadmapCommand::Progress {
                    course_id,
                    progress,
                    status,
                },
        } => to_json(
            &client
                .update_course_progress(course_id, progress, status)
                .await?,
        )?,
        Command::Interview {
            cmd: InterviewCommand::Questions,
        } => to_json(&client.interview_questions().await?)?,
        Command::Interview {
            cmd: InterviewCommand::Question { id },
        } => to_json(&client.interview_question(id).await?)?,
        Command::Interview {
            cmd: InterviewCommand::Categories,
        } => to_json(&client.interview_categories().await?)?,
        Command::Interview {
            cmd: InterviewCommand::Category { name },
        } => to_json(&client.interview_category(&name).await?)?,
        Command::Interview {
            cmd: InterviewCommand::Stats,
        } => to_json(&client.interview_stats().await?)?,
        Command::Chat { message } => {
            let message = message.join(" ");
            to_json(&client.send_chat_message(&message).await?)?
        }
        Command::Request {
            method,
            endpoint,
            fields,
        } => {
            let req = request_from_fields(&method, &endpoint, &fields)?;
            client.send(&req).await?
        }
    };
    print_result_json(result)?;
    Ok(())
}
