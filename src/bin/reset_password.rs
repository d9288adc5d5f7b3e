use std::{io, path::PathBuf, process::ExitCode};

use clap::Parser;
use rusqlite::Connection;

use pocketbook::{
    Email, Error, PasswordHash, PasswordStrength, ValidatedPassword, get_user_by_email,
    set_password_hash,
};

/// Set a new password for a pocketbook account.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The pocketbook SQLite database to update.
    #[arg(long)]
    db_path: PathBuf,

    /// The email address of the account.
    #[arg(long)]
    email: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if !args.db_path.is_file() {
        print_error(format!("no database at {}", args.db_path.display()));
        return ExitCode::FAILURE;
    }

    match reset_password(&args) {
        Ok(true) => {
            println!("Password updated for {}.", args.email.trim());
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::SUCCESS,
        Err(error) => {
            print_error(error);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` if the user closed stdin at a prompt.
fn reset_password(args: &Args) -> Result<bool, Error> {
    let email = Email::new(&args.email)?;
    let conn = Connection::open(&args.db_path)?;
    let user = get_user_by_email(&email, &conn)?;

    let Some(password) = prompt_new_password() else {
        return Ok(false);
    };

    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;
    set_password_hash(user.id, &password_hash, &conn)?;

    Ok(true)
}

/// Ask for a password and its confirmation until both are valid and match.
fn prompt_new_password() -> Option<ValidatedPassword> {
    loop {
        let password = read_password("New password: ")?;

        let strength = PasswordStrength::analyse(&password);
        println!("Strength: {}/5", strength.score());
        if !strength.feedback.is_empty() {
            println!("{}", strength.feedback);
        }

        let confirmation = read_password("Confirm new password: ")?;

        match ValidatedPassword::new_confirmed(&password, &confirmation) {
            Ok(password) => return Some(password),
            Err(error) => print_error(format!("{error}, please try again")),
        }
    }
}

fn read_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("could not read the password: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    let message = error.to_string();
    let mut chars = message.chars();
    let message: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    eprintln!("\x1b[31;1m{message}\x1b[0m");
}
