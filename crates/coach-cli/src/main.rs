//! `coach`: command-line client for the coaching platform API.
//!
//! # Usage
//!
//! ```text
//! coach --url http://localhost:8080 --user-id <uuid> --role CLIENT events list
//! coach --config ~/.config/coach/config.toml register <event-id>
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use coach_core::{
  course::{AccessType, NewCourse},
  event::{Event, NewEvent, RegistrationStatus},
  identity::Role,
};
use serde::Deserialize;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "coach", about = "Command-line client for the coaching platform")]
struct Args {
  /// Path to a TOML config file (url, user_id, role).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the server (default: http://localhost:8080).
  #[arg(long, env = "COACH_URL")]
  url: Option<String>,

  /// Identity to act as.
  #[arg(long, env = "COACH_USER_ID")]
  user_id: Option<Uuid>,

  /// CLIENT, INSTRUCTOR or SUPER_ADMIN (default: CLIENT).
  #[arg(long, env = "COACH_ROLE")]
  role: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Course catalogue and authoring.
  #[command(subcommand)]
  Courses(CourseCommand),
  /// Show whether you may enroll in a course, and why not.
  Access { course_id: Uuid },
  Enroll { course_id: Uuid },
  Unenroll { course_id: Uuid },
  /// Mark a lesson as finished.
  Complete { lesson_id: Uuid },
  /// Join a community as yourself.
  Join { community_id: Uuid },
  #[command(subcommand)]
  Events(EventCommand),
  Register { event_id: Uuid },
  Cancel { event_id: Uuid },
  /// List your notifications, or mark one read.
  Notifications {
    #[arg(long, value_name = "ID")]
    read: Option<Uuid>,
  },
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
  List,
  Lessons { course_id: Uuid },
  Create {
    #[arg(long)]
    title:        String,
    #[arg(long)]
    description:  Option<String>,
    /// OPEN, SEQUENTIAL, COMMUNITY or PRIVATE.
    #[arg(long, default_value = "OPEN")]
    access:       String,
    #[arg(long)]
    prerequisite: Option<Uuid>,
    #[arg(long)]
    community:    Option<Uuid>,
    #[arg(long)]
    publish:      bool,
  },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
  List {
    /// Include events that have already ended.
    #[arg(long)]
    all: bool,
  },
  Create {
    #[arg(long)]
    title:          String,
    /// RFC 3339 start time.
    #[arg(long)]
    starts:         DateTime<Utc>,
    /// RFC 3339 end time.
    #[arg(long)]
    ends:           DateTime<Utc>,
    #[arg(long)]
    max:            Option<u32>,
    /// Registration closes this many hours before the start.
    #[arg(long, default_value_t = 0)]
    deadline_hours: u32,
    #[arg(long)]
    waitlist:       bool,
    /// Drop-in event: no registration window.
    #[arg(long)]
    open_door:      bool,
  },
  /// Who registered (creator or admin only).
  Registrations { event_id: Uuid },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  user_id: Option<Uuid>,
  #[serde(default)]
  role:    String,
}

/// Flags and environment override the config file, which overrides
/// defaults.
fn resolve_config(args: &Args, file: ConfigFile) -> Result<ApiConfig> {
  let user_id = args
    .user_id
    .or(file.user_id)
    .ok_or_else(|| anyhow!("no user id: pass --user-id, set COACH_USER_ID, or add user_id to the config file"))?;

  let role = args
    .role
    .clone()
    .or_else(|| (!file.role.is_empty()).then_some(file.role))
    .unwrap_or_else(|| Role::Client.to_string());
  let role: Role = role
    .to_ascii_uppercase()
    .parse()
    .map_err(|_| anyhow!("unknown role {role:?}"))?;

  Ok(ApiConfig {
    base_url: args
      .url
      .clone()
      .or_else(|| (!file.url.is_empty()).then_some(file.url))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    user_id,
    role: role.to_string(),
  })
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let client = ApiClient::new(resolve_config(&args, file_cfg)?)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Courses(CourseCommand::List) => {
      for c in client.list_courses().await? {
        let state = if c.is_archived {
          "archived"
        } else if c.is_published {
          "published"
        } else {
          "draft"
        };
        println!("{}  {:<10}  {:<9}  {}", c.course_id, c.access_type, state, c.title);
      }
    }
    Command::Courses(CourseCommand::Lessons { course_id }) => {
      for l in client.list_lessons(course_id).await? {
        let draft = if l.is_published { "" } else { "  (draft)" };
        println!("{:>3}. {}  {}{draft}", l.position, l.lesson_id, l.title);
      }
    }
    Command::Courses(CourseCommand::Create {
      title,
      description,
      access,
      prerequisite,
      community,
      publish,
    }) => {
      let access_type: AccessType = access
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| anyhow!("unknown access type {access:?}"))?;
      let course = client
        .create_course(&NewCourse {
          title,
          description,
          access_type,
          prerequisite_id: prerequisite,
          community_id: community,
          is_published: publish,
        })
        .await?;
      println!("created course {}", course.course_id);
    }
    Command::Access { course_id } => {
      let decision = client.check_access(course_id).await?;
      match decision.reason {
        None => println!("allowed"),
        Some(reason) => println!("denied: {reason}"),
      }
    }
    Command::Enroll { course_id } => {
      let enrollment = client.enroll(course_id).await?;
      println!("enrolled since {}", local(enrollment.enrolled_at));
    }
    Command::Unenroll { course_id } => {
      client.unenroll(course_id).await?;
      println!("unenrolled");
    }
    Command::Complete { lesson_id } => {
      let enrollment = client.complete_lesson(lesson_id).await?;
      match enrollment.completed_at {
        Some(at) => println!("course completed at {}", local(at)),
        None => println!("lesson recorded"),
      }
    }
    Command::Join { community_id } => {
      let membership = client.join_community(community_id).await?;
      println!("member since {}", local(membership.joined_at));
    }
    Command::Events(EventCommand::List { all }) => {
      for e in client.list_events(all).await? {
        print_event(&e);
      }
    }
    Command::Events(EventCommand::Create {
      title,
      starts,
      ends,
      max,
      deadline_hours,
      waitlist,
      open_door,
    }) => {
      let event = client
        .create_event(&NewEvent {
          title,
          starts_at: starts,
          ends_at: ends,
          max_attendees: max,
          requires_registration: !open_door,
          registration_deadline_hours: deadline_hours,
          allow_waitlist: waitlist,
        })
        .await?;
      println!("created event {}", event.event_id);
    }
    Command::Events(EventCommand::Registrations { event_id }) => {
      for r in client.list_registrations(event_id).await? {
        println!("{}  {:<10}  {}", r.user_id, r.status, local(r.created_at));
      }
    }
    Command::Register { event_id } => {
      let registration = client.register(event_id).await?;
      match registration.status {
        RegistrationStatus::Confirmed => println!("registered"),
        RegistrationStatus::Waitlisted => println!("event is full; you are on the waitlist"),
      }
    }
    Command::Cancel { event_id } => {
      let cancellation = client.cancel(event_id).await?;
      println!("cancelled");
      if let Some(promoted) = cancellation.promoted {
        println!("{} was promoted from the waitlist", promoted.user_id);
      }
    }
    Command::Notifications { read: Some(id) } => {
      client.mark_read(id).await?;
      println!("marked read");
    }
    Command::Notifications { read: None } => {
      for n in client.list_notifications().await? {
        let marker = if n.read_at.is_some() { ' ' } else { '*' };
        println!("{marker} {}  {}  {}", local(n.created_at), n.title, n.body);
        println!("  {}", n.notification_id);
      }
    }
  }
  Ok(())
}

fn local(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn print_event(e: &Event) {
  let capacity = e
    .max_attendees
    .map_or_else(|| "unlimited".to_string(), |m| format!("max {m}"));
  let waitlist = if e.allow_waitlist { ", waitlist" } else { "" };
  println!(
    "{}  {}  {}  ({capacity}{waitlist})",
    e.event_id,
    local(e.starts_at),
    e.title
  );
}
