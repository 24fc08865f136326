#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # edu
//!
//! Command line front end for EduTools course files and the remote learning
//! platforms.
//!
//! Reads, migrates and validates course JSON documents, reads the YAML
//! configuration authors keep next to course content, and talks to Stepik,
//! CheckiO and Hyperskill. Accounts are kept in the settings file named by
//! `EDU_SETTINGS_PATH`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use edutools::{
    checkio::{CheckiOConnector, CheckiOPlatform},
    config,
    course::Course,
    format::{json, yaml},
    hyperskill::HyperskillConnector,
    settings::Settings,
    stepik::{FsSolutionSink, SolutionsLoader, StepikClient},
    updates,
};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, object::Rows},
};
use tracing::{Level, info, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Course file subcommands.
#[derive(Debug, Clone)]
enum CourseCmd {
    /// Upgrade a course file to the current format
    Migrate(PathBuf, Option<PathBuf>),
    /// Print the course tree
    Info(PathBuf),
    /// Check placeholder bounds
    Validate(PathBuf),
}

/// YAML config subcommands.
#[derive(Debug, Clone)]
enum YamlCmd {
    /// Read a task config with its files
    Task(PathBuf),
    /// Read a course config
    Course(PathBuf),
}

/// Stepik subcommands.
#[derive(Debug, Clone)]
enum StepikCmd {
    /// Log in through the browser
    Login,
    /// Download a course
    Course(u64, Option<PathBuf>),
    /// Load submitted solutions into a course directory
    Sync(PathBuf, PathBuf),
    /// List courses published since the last check, even before the
    /// interval has passed when set
    NewCourses(bool),
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Course file operations
    Course(CourseCmd),
    /// YAML config operations
    Yaml(YamlCmd),
    /// Stepik operations
    Stepik(StepikCmd),
    /// CheckiO login, JavaScript platform when set
    CheckiOLogin(bool),
    /// Hyperskill login
    HyperskillLogin,
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses a course file path
    fn course_file() -> impl Parser<PathBuf> {
        positional("COURSE").help("Path to a course JSON file")
    }

    /// parses an optional output path
    fn output() -> impl Parser<Option<PathBuf>> {
        short('o')
            .long("output")
            .help("Write to this file instead of stdout")
            .argument("PATH")
            .optional()
    }

    /// parses a YAML config path
    fn config_file() -> impl Parser<PathBuf> {
        positional("CONFIG").help("Path to a YAML config file")
    }

    let course_migrate = construct!(CourseCmd::Migrate(course_file(), output()))
        .to_options()
        .command("migrate")
        .help("Upgrade a course file to the current format version");

    let course_info = construct!(CourseCmd::Info(course_file()))
        .to_options()
        .command("info")
        .help("Print the lessons and tasks of a course");

    let course_validate = construct!(CourseCmd::Validate(course_file()))
        .to_options()
        .command("validate")
        .help("Check that every placeholder fits into its file");

    let course = construct!([course_migrate, course_info, course_validate])
        .to_options()
        .command("course")
        .help("Course file commands")
        .map(Cmd::Course);

    let yaml_task = construct!(YamlCmd::Task(config_file()))
        .to_options()
        .command("task")
        .help("Read a task-info.yaml and the files next to it");

    let yaml_course = construct!(YamlCmd::Course(config_file()))
        .to_options()
        .command("course")
        .help("Read a course-info.yaml");

    let yaml = construct!([yaml_task, yaml_course])
        .to_options()
        .command("yaml")
        .help("YAML course config commands")
        .map(Cmd::Yaml);

    let stepik_login = pure(StepikCmd::Login)
        .to_options()
        .command("login")
        .help("Log in to Stepik");

    let course_id = positional::<u64>("ID").help("Stepik course id");
    let stepik_course = construct!(StepikCmd::Course(course_id, output()))
        .to_options()
        .command("course")
        .help("Download a course as JSON");

    let course_dir = positional::<PathBuf>("DIR").help("Course directory to write solutions to");
    let stepik_sync = construct!(StepikCmd::Sync(course_file(), course_dir))
        .to_options()
        .command("sync")
        .help("Load your latest submissions into a course");

    let force = long("force")
        .help("Check even if the last check is recent")
        .switch();
    let stepik_new = construct!(StepikCmd::NewCourses(force))
        .to_options()
        .command("new-courses")
        .help("List courses published since the last check");

    let stepik = construct!([stepik_login, stepik_course, stepik_sync, stepik_new])
        .to_options()
        .command("stepik")
        .help("Stepik commands")
        .map(Cmd::Stepik);

    let js = long("js").help("Use the JavaScript mission platform").switch();
    let checkio = construct!(Cmd::CheckiOLogin(js))
        .to_options()
        .command("login")
        .help("Log in to CheckiO")
        .to_options()
        .command("checkio")
        .help("CheckiO commands");

    let hyperskill = pure(Cmd::HyperskillLogin)
        .to_options()
        .command("login")
        .help("Log in to Hyperskill")
        .to_options()
        .command("hyperskill")
        .help("Hyperskill commands");

    let cmd = construct!([course, yaml, stepik, checkio, hyperskill]);

    cmd.to_options()
        .descr("EduTools course files and learning platforms")
        .run()
}

/// One row of `course info`.
#[derive(Tabled)]
struct TaskRow {
    /// `section/lesson/task` path.
    #[tabled(rename = "Task")]
    path:   String,
    /// Task kind.
    #[tabled(rename = "Type")]
    kind:   String,
    /// Number of task files.
    #[tabled(rename = "Files")]
    files:  usize,
    /// Stepik step id.
    #[tabled(rename = "Step")]
    step:   u64,
    /// Check status.
    #[tabled(rename = "Status")]
    status: String,
}

/// Reads a course file of any version.
fn read_course(path: &Path) -> Result<Course> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    json::read_course(&text).with_context(|| format!("Could not load course {}", path.display()))
}

/// Writes `text` to `output`, or stdout when there is none.
fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Could not write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Prints the task table of `course`.
fn print_course(course: &Course) {
    let rows: Vec<TaskRow> = course
        .tasks()
        .into_iter()
        .map(|(loc, task)| TaskRow {
            path:   course.task_path(loc).unwrap_or_default(),
            kind:   task.kind.to_string(),
            files:  task.task_files.len(),
            step:   task.step_id,
            status: task.status.to_string(),
        })
        .collect();
    let total = rows.len();
    println!(
        "{}",
        Table::new(rows)
            .with(Panel::header(format!("{} ({})", course.name, course.programming_language)))
            .with(Panel::footer(format!("{total} tasks")))
            .with(
                Modify::new(Rows::first())
                    .with(Alignment::center())
                    .with(Alignment::center_vertical()),
            )
            .with(Style::modern())
    );
}

/// Loads settings from the configured path.
fn load_settings() -> Result<(Settings, PathBuf)> {
    let path = config::settings_path()?;
    Ok((Settings::load(&path)?, path))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();
    let config = config::ensure_initialized()?;

    match cmd {
        Cmd::Course(course_cmd) => match course_cmd {
            CourseCmd::Migrate(path, output) => {
                let course = read_course(&path)?;
                emit(&json::write_course(&course)?, output.as_deref())?;
            }
            CourseCmd::Info(path) => print_course(&read_course(&path)?),
            CourseCmd::Validate(path) => {
                let course = read_course(&path)?;
                let problems = course.validate();
                for (loc, problem) in &problems {
                    let at = course.task_path(*loc).unwrap_or_default();
                    eprintln!("{} {at}: {problem}", "error:".red().bold());
                }
                if !problems.is_empty() {
                    bail!("{} placeholder problems found", problems.len());
                }
                eprintln!("{}", "Course is valid".green());
            }
        },
        Cmd::Yaml(yaml_cmd) => match yaml_cmd {
            YamlCmd::Task(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Could not read {}", path.display()))?;
                let dir = path.parent().map(PathBuf::from).unwrap_or_default();
                let task = yaml::task_with_texts(&text, |name| {
                    std::fs::read_to_string(dir.join(name)).ok()
                })?;
                println!("{}", serde_json::to_string_pretty(&task)?);
            }
            YamlCmd::Course(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Could not read {}", path.display()))?;
                print_course(&yaml::course(&text)?);
            }
        },
        Cmd::Stepik(stepik_cmd) => {
            let (mut settings, settings_path) = load_settings()?;
            let client = StepikClient::from_config(&config).with_account(settings.stepik_account.clone());
            match stepik_cmd {
                StepikCmd::Login => {
                    let account = client.login_interactively().await?;
                    settings.stepik_account = Some(account);
                }
                StepikCmd::Course(id, output) => {
                    let course = client.load_course(id).await?;
                    emit(&json::write_course(&course)?, output.as_deref())?;
                }
                StepikCmd::Sync(path, dir) => {
                    if settings.stepik_account.is_none() {
                        bail!("Log in to Stepik first with `edu stepik login`");
                    }
                    let mut course = read_course(&path)?;
                    let loader =
                        SolutionsLoader::new(Arc::new(client.clone()), config.solutions_concurrency());
                    let report = loader
                        .load_solutions(&mut course, &mut FsSolutionSink::new(dir))
                        .await?;
                    std::fs::write(&path, json::write_course(&course)?)
                        .with_context(|| format!("Could not write {}", path.display()))?;
                    info!("Updated {} tasks, {} failed", report.updated, report.failed);
                    if report.needs_update_notification {
                        eprintln!(
                            "{}",
                            "Some solutions need a newer version of edu to be loaded".yellow()
                        );
                    }
                }
                StepikCmd::NewCourses(force) => {
                    let now = chrono::Utc::now();
                    let delay = updates::next_check_delay(
                        settings.last_time_checked,
                        config.new_courses_interval(),
                        now,
                    );
                    if !force && !delay.is_zero() {
                        info!("Next check is due in {} minutes", delay.as_secs() / 60);
                        return Ok(());
                    }
                    let courses = client.idea_compatible_courses().await?;
                    let fresh = updates::new_courses(&courses, &mut settings, now);
                    for course in &fresh {
                        println!("{} {}", course.id.to_string().bright_blue(), course.title);
                    }
                    if fresh.is_empty() {
                        info!("No new courses");
                    }
                }
            }
            settings.stepik_account = client.account().await;
            settings.save(&settings_path)?;
        }
        Cmd::CheckiOLogin(js) => {
            let platform = if js {
                CheckiOPlatform::Js
            } else {
                CheckiOPlatform::Py
            };
            let (mut settings, settings_path) = load_settings()?;
            let connector = CheckiOConnector::from_config(&config, platform)
                .with_account(settings.checkio_accounts.get(&platform).cloned());
            let account = connector.login_interactively().await?;
            settings.checkio_accounts.insert(platform, account);
            settings.save(&settings_path)?;
        }
        Cmd::HyperskillLogin => {
            let (mut settings, settings_path) = load_settings()?;
            let connector = HyperskillConnector::from_config(&config);
            let account = connector.login_interactively().await?;
            settings.hyperskill_account = Some(account);
            settings.save(&settings_path)?;
        }
    }

    Ok(())
}
