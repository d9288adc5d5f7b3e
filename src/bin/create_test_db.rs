use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rust_decimal::Decimal;
use rusqlite::Connection;
use time::Date;

use pocketbook::{
    Amount, CalendarZone, Email, MonthKey, PasswordHash, SQLiteGateway, Transaction,
    TransactionGateway, TransactionType, ValidatedPassword, create_user, initialize_db,
};

/// A utility for creating a test database for pocketbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The timezone in which the sample dates are written, e.g. "Asia/Bangkok".
    #[arg(long, default_value = "UTC")]
    timezone: String,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test1234";
const MONTHS_OF_DATA: usize = 12;

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    let zone = CalendarZone::from_name(&args.timezone)?;

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with the password {TEST_PASSWORD}...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        &Email::new(TEST_EMAIL)?,
        Some(password_hash),
        Some("Test User"),
        &conn,
    )?;

    println!("Creating {MONTHS_OF_DATA} months of transactions...");

    let gateway = SQLiteGateway::new(Arc::new(Mutex::new(conn)));
    let months = std::iter::successors(Some(MonthKey::current(&zone)), |key| {
        Some(key.previous())
    })
    .take(MONTHS_OF_DATA);

    for (index, month) in months.enumerate() {
        let day = |day: u8| -> Result<_, Box<dyn Error>> {
            let date = Date::from_calendar_date(month.year(), month.month(), day)?;

            Ok(zone.start_of_day(date))
        };
        let groceries = Decimal::new(150_000 + 7_500 * index as i64, 2);

        for (name, amount, type_, date) in [
            ("Rent", Decimal::new(9_000, 0), TransactionType::Expense, day(1)?),
            ("Electricity", Decimal::new(1_250, 0), TransactionType::Expense, day(10)?),
            ("Groceries", groceries, TransactionType::Expense, day(15)?),
            ("Salary", Decimal::new(30_000, 0), TransactionType::Income, day(25)?),
        ] {
            gateway.create_record(
                user.id,
                Transaction::build(name, Amount::new(amount)?, type_, date),
            )?;
        }
    }

    println!("Success!");

    Ok(())
}
