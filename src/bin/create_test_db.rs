use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;

use foyer_rs::{PasswordHash, ValidatedPassword, initialize_db};

/// A utility for creating a test database for the REST API server of
/// foyer_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

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

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users and family...");

    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked("test"))?;

    conn.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        ("alex@example.com", password_hash.to_string()),
    )?;
    let creator_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO family (creator_user_id) VALUES (?1)",
        (creator_id,),
    )?;
    let family_id = conn.last_insert_rowid();

    for kind in ["main", "savings", "investment"] {
        conn.execute(
            "INSERT INTO account (family_id, kind, balance) VALUES (?1, ?2, 0)",
            (family_id, kind),
        )?;
    }

    conn.execute(
        "INSERT INTO family_member (family_id, user_id, name, relationship, role)
         VALUES (?1, ?2, 'Alex', 'self', 'admin')",
        (family_id, creator_id),
    )?;
    let member_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO member_income_type (member_id, income_type) VALUES (?1, 'salary')",
        (member_id,),
    )?;

    println!("Posting a sample ledger...");

    conn.execute(
        "INSERT INTO income (member_id, amount, income_type, date, account_kind)
         VALUES (?1, 2500.0, 'salary', ?2, 'main')",
        (member_id, date!(2025 - 03 - 01)),
    )?;
    conn.execute(
        "UPDATE account SET balance = balance + 2500.0 WHERE family_id = ?1 AND kind = 'main'",
        (family_id,),
    )?;

    conn.execute(
        "INSERT INTO expense
             (member_id, amount, category, date, description, is_planned, account_kind)
         VALUES (?1, 120.0, 'groceries', ?2, 'weekly shop', 0, 'main')",
        (member_id, date!(2025 - 03 - 03)),
    )?;
    conn.execute(
        "UPDATE account SET balance = balance - 120.0 WHERE family_id = ?1 AND kind = 'main'",
        (family_id,),
    )?;

    println!("Success!");

    Ok(())
}
