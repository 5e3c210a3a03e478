//! daycard account commands: signup, login, logout, whoami.

use std::path::PathBuf;

use serde::Serialize;

use crate::auth::UserProfile;
use crate::cli::AppContext;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct SignupOptions {
    pub name: String,
    pub email: String,
    pub password: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct LoginOptions {
    pub email: String,
    pub password: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct SessionReport {
    signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
}

pub fn run_signup(options: SignupOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let profile = ctx
        .users()
        .signup(&options.name, &options.email, &options.password)?;
    ctx.session().sign_in(&profile)?;

    let mut human = HumanOutput::new(format!("Welcome, {}", profile.name));
    push_profile(&mut human, &profile);
    human.push_next_step("daycard add \"09:00-10:00 Plan the day\"");

    emit_success(
        options.output,
        "signup",
        &SessionReport {
            signed_in: true,
            user: Some(profile),
        },
        Some(&human),
    )
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let profile = ctx.users().login(&options.email, &options.password)?;
    ctx.session().sign_in(&profile)?;

    let mut human = HumanOutput::new(format!("Signed in as {}", profile.name));
    push_profile(&mut human, &profile);
    human.push_next_step("daycard cards");

    emit_success(
        options.output,
        "login",
        &SessionReport {
            signed_in: true,
            user: Some(profile),
        },
        Some(&human),
    )
}

pub fn run_logout(data_dir: Option<PathBuf>, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::open(data_dir);
    let was_signed_in = ctx.session().sign_out()?;

    let header = if was_signed_in {
        "Signed out"
    } else {
        "Not signed in"
    };
    let human = HumanOutput::new(header);

    emit_success(
        output,
        "logout",
        &SessionReport {
            signed_in: false,
            user: None,
        },
        Some(&human),
    )
}

pub fn run_whoami(data_dir: Option<PathBuf>, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::open(data_dir);
    let current = ctx.session().current()?;

    let mut human = match &current {
        Some(profile) => {
            let mut human = HumanOutput::new(format!("Signed in as {}", profile.name));
            push_profile(&mut human, profile);
            human
        }
        None => {
            let mut human = HumanOutput::new("Not signed in");
            human.push_next_step("daycard login --email <email> --password <password>");
            human
        }
    };
    human.push_summary("data dir", ctx.storage.data_dir().display().to_string());

    emit_success(
        output,
        "whoami",
        &SessionReport {
            signed_in: current.is_some(),
            user: current,
        },
        Some(&human),
    )
}

fn push_profile(human: &mut HumanOutput, profile: &UserProfile) {
    human.push_summary("name", profile.name.clone());
    human.push_summary("email", profile.email.clone());
    human.push_summary("id", profile.id.clone());
}
