// Quick diagnostic to check database state
use clap::Parser;
use cohort_server::db::Database;
use cohort_server::legacy::{MESSAGE_TAG_PREFIX, METADATA_TAG};

#[derive(Parser, Debug)]
#[command(name = "check-db", about = "Print row counts and leftover legacy community rows")]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "./cohort.db")]
    database: String,
}

const TABLES: &[&str] = &[
    "profiles",
    "courses",
    "community_posts",
    "post_likes",
    "comments",
    "communities",
    "community_members",
    "community_messages",
    "sessions",
];

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if !std::path::Path::new(&args.database).exists() {
        anyhow::bail!("Database file not found: {}", args.database);
    }

    let db = Database::new(&args.database)?;
    let conn = db.pool.get()?;

    println!("=== Database Diagnostic ===\n");

    for table in TABLES {
        let exists: i32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            println!("{:<20} (missing)", table);
            continue;
        }
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        println!("{:<20} {}", table, count);
    }

    println!("\n=== Legacy community rows ===");
    let metadata: i64 = conn.query_row(
        "SELECT COUNT(*) FROM community_posts WHERE instr(title, ?) = 1",
        [METADATA_TAG],
        |row| row.get(0),
    )?;
    let messages: i64 = conn.query_row(
        "SELECT COUNT(*) FROM community_posts WHERE instr(title, ?) = 1",
        [MESSAGE_TAG_PREFIX],
        |row| row.get(0),
    )?;
    println!("Metadata rows: {}", metadata);
    println!("Message rows: {}", messages);

    if metadata + messages > 0 {
        println!("\nRun cohort-migrate to convert these rows.");
    } else {
        println!("\nNo legacy rows left.");
    }

    Ok(())
}
