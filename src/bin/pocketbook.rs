use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::level_filters::LevelFilter;

use pocketbook::{
    AppState, CalendarZone, Error, Locale, MonthFilter, MonthKey, Operation, PasswordHash,
    PasswordStrength, SQLiteGateway, Session, Transaction, TransactionForm, TransactionId,
    TransactionType, format_currency, income_expense_chart, log_in, month_options, register_user,
    setup_logging,
};

/// Record income and expenses and see where the money went each month.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "pocketbook.db")]
    db_path: String,

    /// The timezone in which days and months are counted, e.g. "Asia/Bangkok".
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// The language of messages and labels, "en" or "th".
    #[arg(long, default_value_t = Locale::English)]
    locale: Locale,

    /// The lowest level of log messages to print. RUST_LOG takes precedence.
    #[arg(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

/// The account to sign in with. The password is read from the terminal.
#[derive(clap::Args, Debug)]
struct SignIn {
    /// The email address of the account.
    #[arg(long)]
    email: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Register {
        /// The email address to sign in with.
        #[arg(long)]
        email: String,
        /// The name to greet you with.
        #[arg(long)]
        name: Option<String>,
    },
    /// Record a transaction.
    Add {
        #[command(flatten)]
        sign_in: SignIn,
        /// What the transaction was for.
        #[arg(long)]
        name: String,
        /// The amount, e.g. 1250.50.
        #[arg(long)]
        amount: String,
        /// "income" or "expense".
        #[arg(long = "type", default_value_t = TransactionType::Expense)]
        type_: TransactionType,
        /// The date in the format YYYY-MM-DD, today if omitted.
        #[arg(long)]
        date: Option<String>,
    },
    /// Change a transaction. Omitted fields keep their value.
    Edit {
        #[command(flatten)]
        sign_in: SignIn,
        /// The ID of the transaction, as shown by `list`.
        id: TransactionId,
        /// What the transaction was for.
        #[arg(long)]
        name: Option<String>,
        /// The amount, e.g. 1250.50.
        #[arg(long)]
        amount: Option<String>,
        /// "income" or "expense".
        #[arg(long = "type")]
        type_: Option<TransactionType>,
        /// The date in the format YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a transaction.
    Delete {
        #[command(flatten)]
        sign_in: SignIn,
        /// The ID of the transaction, as shown by `list`.
        id: TransactionId,
        /// Delete without asking for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
    /// List transactions, newest first.
    List {
        #[command(flatten)]
        sign_in: SignIn,
        /// "all" or a month in the format YYYY-MM.
        #[arg(long, default_value_t)]
        month: MonthFilter,
        /// Print the transactions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the income, expenses and balance.
    Summary {
        #[command(flatten)]
        sign_in: SignIn,
        /// "all" or a month in the format YYYY-MM.
        #[arg(long, default_value_t)]
        month: MonthFilter,
    },
    /// Print the income/expense chart as ECharts options.
    Chart {
        #[command(flatten)]
        sign_in: SignIn,
        /// "all" or a month in the format YYYY-MM.
        #[arg(long, default_value_t)]
        month: MonthFilter,
    },
    /// List the months that can be selected.
    Months,
}

/// Why a command failed.
enum Failure {
    /// The application returned an error while performing `Operation`.
    App(Operation, Error),
    /// The terminal could not be read.
    Input(io::Error),
    /// The user backed out at a prompt.
    Cancelled,
}

fn fail(operation: Operation) -> impl FnOnce(Error) -> Failure {
    move |error| Failure::App(operation, error)
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.log_level);

    let locale = args.locale;

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::App(operation, error)) => {
            tracing::debug!("Command failed: {error}");
            print_error(error.user_message(operation, locale));
            ExitCode::FAILURE
        }
        Err(Failure::Input(error)) => {
            print_error(format!("could not read from the terminal: {error}"));
            ExitCode::FAILURE
        }
        Err(Failure::Cancelled) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), Failure> {
    if let Command::Months = args.command {
        let zone = CalendarZone::from_name(&args.timezone).map_err(fail(Operation::LogIn))?;
        for option in month_options(MonthKey::current(&zone), args.locale) {
            println!("{}\t{}", option.filter, option.label);
        }

        return Ok(());
    }

    let connection = Connection::open(&args.db_path)
        .map_err(Error::from)
        .map_err(fail(Operation::LogIn))?;
    let state =
        AppState::new(connection, &args.timezone, args.locale).map_err(fail(Operation::LogIn))?;
    let locale = state.locale;

    match args.command {
        Command::Register { email, name } => register(&state, &email, name.as_deref()),
        Command::Add {
            sign_in,
            name,
            amount,
            type_,
            date,
        } => {
            let session = start_session(&state, &sign_in)?;
            let mut form = TransactionForm::new(state.calendar_zone.today());
            form.name = name;
            form.amount = amount;
            form.type_ = type_;
            if let Some(date) = date {
                form.date = date;
            }

            let id = session
                .add_transaction(&form)
                .map_err(fail(Operation::Add))?;
            println!("{id}");
            session.sign_out();

            Ok(())
        }
        Command::Edit {
            sign_in,
            id,
            name,
            amount,
            type_,
            date,
        } => {
            let session = start_session(&state, &sign_in)?;
            let existing = session
                .with_dashboard(|dashboard| find_transaction(dashboard.all_transactions(), id))
                .map_err(fail(Operation::Update))?
                .ok_or(Failure::App(Operation::Update, Error::UpdateMissingTransaction))?;

            let mut form = TransactionForm::from_transaction(&existing, &state.calendar_zone);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(amount) = amount {
                form.amount = amount;
            }
            if let Some(type_) = type_ {
                form.type_ = type_;
            }
            if let Some(date) = date {
                form.date = date;
            }

            session
                .edit_transaction(id, &form)
                .map_err(fail(Operation::Update))?;
            session.sign_out();

            Ok(())
        }
        Command::Delete { sign_in, id, yes } => {
            let session = start_session(&state, &sign_in)?;

            if !yes && !confirm(locale.confirm_delete())? {
                session.sign_out();
                return Err(Failure::Cancelled);
            }

            session
                .delete_transaction(id)
                .map_err(fail(Operation::Delete))?;
            session.sign_out();

            Ok(())
        }
        Command::List {
            sign_in,
            month,
            json,
        } => {
            let session = start_session(&state, &sign_in)?;
            session
                .set_month_filter(month)
                .map_err(fail(Operation::LogIn))?;
            let transactions = session
                .with_dashboard(|dashboard| dashboard.transactions().to_vec())
                .map_err(fail(Operation::LogIn))?;

            if json {
                let json = serde_json::to_string_pretty(&transactions)
                    .map_err(|error| Error::JSONSerializationError(error.to_string()))
                    .map_err(fail(Operation::LogIn))?;
                println!("{json}");
            } else if transactions.is_empty() {
                println!("{}", locale.no_transactions());
            } else {
                for transaction in &transactions {
                    println!(
                        "{}",
                        transaction_line(transaction, &state.calendar_zone, locale)
                    );
                }
            }
            session.sign_out();

            Ok(())
        }
        Command::Summary { sign_in, month } => {
            let session = start_session(&state, &sign_in)?;
            session
                .set_month_filter(month)
                .map_err(fail(Operation::LogIn))?;
            let (summary, bars) = session
                .with_dashboard(|dashboard| (dashboard.summary(), dashboard.chart_bars(locale)))
                .map_err(fail(Operation::LogIn))?;

            println!(
                "{} ({})",
                session.user().greeting_name(locale),
                month.label(locale)
            );
            let [income_title, expense_title, balance_title] = locale.summary_titles();
            println!("{income_title}: {}", format_currency(summary.income));
            println!("{expense_title}: {}", format_currency(summary.expense));
            println!("{balance_title}: {}", format_currency(summary.balance));
            println!();
            for bar in bars {
                println!("{}\t{}\t{}", bar.color, bar.label, format_currency(bar.value));
            }
            session.sign_out();

            Ok(())
        }
        Command::Chart { sign_in, month } => {
            let session = start_session(&state, &sign_in)?;
            session
                .set_month_filter(month)
                .map_err(fail(Operation::LogIn))?;
            let summary = session
                .with_dashboard(|dashboard| dashboard.summary())
                .map_err(fail(Operation::LogIn))?;

            println!("{}", income_expense_chart(&summary, locale));
            session.sign_out();

            Ok(())
        }
        Command::Months => Ok(()),
    }
}

fn register(state: &AppState, email: &str, name: Option<&str>) -> Result<(), Failure> {
    let password = prompt_password("Password: ")?;

    let strength = PasswordStrength::analyse(&password);
    println!("{}", strength.label(state.locale));
    if !strength.feedback.is_empty() {
        println!("{}", strength.feedback);
    }

    let confirm_password = prompt_password("Confirm password: ")?;

    let user = state
        .with_connection(|connection| {
            register_user(
                email,
                &password,
                &confirm_password,
                name,
                PasswordHash::DEFAULT_COST,
                connection,
            )
        })
        .map_err(fail(Operation::Register))?;

    println!("{}", user.greeting_name(state.locale));

    Ok(())
}

fn start_session(state: &AppState, sign_in: &SignIn) -> Result<Session<SQLiteGateway>, Failure> {
    let password = prompt_password("Password: ")?;

    let user = state
        .with_connection(|connection| log_in(&sign_in.email, &password, connection))
        .map_err(fail(Operation::LogIn))?;

    Session::start(user, state.gateway.clone(), state.calendar_zone)
        .map_err(fail(Operation::LogIn))
}

fn find_transaction(transactions: &[Transaction], id: TransactionId) -> Option<Transaction> {
    transactions
        .iter()
        .find(|transaction| transaction.id == id)
        .cloned()
}

fn transaction_line(transaction: &Transaction, zone: &CalendarZone, locale: Locale) -> String {
    let form = TransactionForm::from_transaction(transaction, zone);

    format!(
        "{}\t{}\t{}\t{}\t{}",
        form.date,
        transaction.type_.label(locale),
        format_currency(transaction.signed_amount()),
        transaction.name,
        transaction.id
    )
}

fn prompt_password(prompt: &str) -> Result<String, Failure> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Ok(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Err(Failure::Cancelled),
        Err(error) => Err(Failure::Input(error)),
    }
}

fn confirm(question: &str) -> Result<bool, Failure> {
    print!("{question} [y/N] ");
    io::stdout().flush().map_err(Failure::Input)?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(Failure::Input)?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
