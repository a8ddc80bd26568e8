use anyhow::{Context, Result};
use clap::Parser;
use cohort_server::db::repositories::{CommunityRepository, CourseRepository};
use cohort_server::db::Database;
use cohort_server::legacy::{classify_title, parse_metadata, LegacyTag, MESSAGE_TAG_PREFIX, METADATA_TAG};
use cohort_types::MemberRole;
use std::collections::HashMap;
use uuid::Uuid;

/// Cohort Legacy Community Migration Utility
///
/// Converts communities that were stored as title-tagged feed posts
/// (`[COMMUNITY_METADATA]` and `[COMMUNITY:<id>]`) into rows of the
/// `communities`, `community_members` and `community_messages` tables.
#[derive(Parser, Debug)]
#[command(name = "cohort-migrate")]
#[command(about = "Convert legacy title-tagged community posts into community tables", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "./cohort.db")]
    database: String,

    /// Perform a dry run without making changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Delete legacy rows that cannot be converted instead of leaving them in place
    #[arg(long)]
    drop_orphans: bool,
}

/// A `community_posts` row carrying a legacy community tag
#[derive(Debug, Clone)]
struct LegacyRow {
    id: String,
    instructor_id: String,
    author_id: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug)]
struct PlannedCommunity {
    id: Uuid,
    /// Id of the metadata row the community came from
    legacy_id: String,
    instructor_id: String,
    name: String,
    description: String,
    course_id: Option<String>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

#[derive(Debug)]
struct PlannedMessage {
    id: Uuid,
    legacy_id: String,
    community_id: Uuid,
    author_id: String,
    content: String,
    created_at: String,
    updated_at: String,
}

/// A legacy row that cannot be converted, with the reason
#[derive(Debug)]
struct Orphan {
    id: String,
    reason: String,
}

#[derive(Debug, Default)]
struct MigrationPlan {
    communities: Vec<PlannedCommunity>,
    messages: Vec<PlannedMessage>,
    orphans: Vec<Orphan>,
}

/// Statistics collected during migration
#[derive(Debug, Default)]
struct MigrationStats {
    /// Communities inserted (existing ids are skipped)
    communities_created: usize,
    /// Messages inserted (existing ids are skipped)
    messages_created: usize,
    /// Message authors enrolled as members so they can keep posting
    members_added: usize,
    /// Converted legacy rows removed from the feed table
    legacy_rows_removed: usize,
    /// Orphan rows deleted because of --drop-orphans
    orphans_dropped: usize,
}

/// Id for a converted legacy row or community reference.
///
/// UUID ids are kept; any other id maps to a name-based UUID so that reruns
/// and later messages resolve to the same row.
fn legacy_uuid(legacy_id: &str) -> Uuid {
    Uuid::parse_str(legacy_id).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, legacy_id.as_bytes()))
}

/// Query every feed row that still carries a legacy tag, oldest first
fn load_legacy_rows(db: &Database) -> Result<Vec<LegacyRow>> {
    let conn = db.connection().context("Failed to get database connection")?;

    let mut stmt = conn
        .prepare(
            "SELECT id, instructor_id, author_id, title, content, created_at, updated_at
             FROM community_posts
             WHERE instr(title, ?1) = 1 OR instr(title, ?2) = 1
             ORDER BY created_at ASC, rowid ASC",
        )
        .context("Failed to prepare query")?;

    let rows = stmt
        .query_map((METADATA_TAG, MESSAGE_TAG_PREFIX), |row| {
            Ok(LegacyRow {
                id: row.get(0)?,
                instructor_id: row.get(1)?,
                author_id: row.get(2)?,
                title: row.get(3)?,
                content: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })
        .context("Failed to execute query")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to collect legacy rows")?;

    Ok(rows)
}

/// Decide what every legacy row becomes without touching the database.
///
/// Metadata rows are resolved first so that messages may precede their
/// community in row order. Messages whose metadata row is gone fall back to
/// communities converted by an earlier run.
fn plan_migration(rows: &[LegacyRow], db: &Database) -> Result<MigrationPlan> {
    let courses = CourseRepository::new(db.pool.clone());
    let communities = CommunityRepository::new(db.pool.clone());
    let mut plan = MigrationPlan::default();
    let mut community_ids: HashMap<&str, Uuid> = HashMap::new();

    for row in rows {
        let label = match classify_title(&row.title) {
            Ok(Some(LegacyTag::Metadata { label })) => label,
            Ok(_) => continue,
            Err(e) => {
                plan.orphans.push(Orphan { id: row.id.clone(), reason: e.to_string() });
                continue;
            }
        };

        let meta = match parse_metadata(&row.content) {
            Ok(meta) => meta,
            Err(e) => {
                plan.orphans.push(Orphan { id: row.id.clone(), reason: e.to_string() });
                continue;
            }
        };

        let id = legacy_uuid(&row.id);

        let instructor = Uuid::parse_str(&row.instructor_id)
            .with_context(|| format!("Row {} has a malformed instructor id", row.id))?;
        let course_id = match meta.course_id.as_deref().map(Uuid::parse_str) {
            Some(Ok(course)) if courses.is_taught_by(&course, &instructor)? => Some(course.to_string()),
            Some(_) => {
                println!("  note: community {} links an unknown course, leaving it unlinked", row.id);
                None
            }
            None => None,
        };

        let name = if meta.name.trim().is_empty() { label.to_string() } else { meta.name.trim().to_string() };
        if name.is_empty() {
            plan.orphans.push(Orphan { id: row.id.clone(), reason: "community has no name".to_string() });
            continue;
        }

        community_ids.insert(row.id.as_str(), id);
        plan.communities.push(PlannedCommunity {
            id,
            legacy_id: row.id.clone(),
            instructor_id: row.instructor_id.clone(),
            name,
            description: meta.description,
            course_id,
            is_active: meta.is_active,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        });
    }

    for row in rows {
        let Ok(Some(LegacyTag::Message { community_id, rest })) = classify_title(&row.title) else {
            continue;
        };

        let target = match community_ids.get(community_id) {
            Some(&id) => Some(id),
            None => {
                let id = legacy_uuid(community_id);
                communities.get_by_id(&id)?.map(|_| id)
            }
        };
        let Some(target) = target else {
            plan.orphans.push(Orphan {
                id: row.id.clone(),
                reason: format!("unknown community '{}'", community_id),
            });
            continue;
        };

        let content = if rest.is_empty() {
            row.content.clone()
        } else {
            format!("{}\n\n{}", rest, row.content)
        };

        plan.messages.push(PlannedMessage {
            id: legacy_uuid(&row.id),
            legacy_id: row.id.clone(),
            community_id: target,
            author_id: row.author_id.clone(),
            content,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
        });
    }

    Ok(plan)
}

/// Write the plan in a single transaction and remove the converted rows
fn apply_plan(db: &Database, plan: &MigrationPlan, drop_orphans: bool) -> Result<MigrationStats> {
    let mut stats = MigrationStats::default();
    let mut conn = db.connection().context("Failed to get database connection")?;
    let tx = conn.transaction()?;

    for community in &plan.communities {
        stats.communities_created += tx
            .execute(
                "INSERT OR IGNORE INTO communities (id, instructor_id, name, description, course_id, is_active, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    community.id.to_string(),
                    community.instructor_id,
                    community.name,
                    community.description,
                    community.course_id,
                    community.is_active,
                    community.created_at,
                    community.updated_at,
                ],
            )
            .with_context(|| format!("Failed to insert community {}", community.id))?;

        tx.execute(
            "INSERT OR IGNORE INTO community_members (community_id, profile_id, role, joined_at) VALUES (?, ?, ?, ?)",
            (
                community.id.to_string(),
                &community.instructor_id,
                MemberRole::Owner.as_str(),
                &community.created_at,
            ),
        )
        .with_context(|| format!("Failed to add owner of community {}", community.id))?;
    }

    for message in &plan.messages {
        stats.messages_created += tx
            .execute(
                "INSERT OR IGNORE INTO community_messages (id, community_id, author_id, content, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    message.id.to_string(),
                    message.community_id.to_string(),
                    &message.author_id,
                    &message.content,
                    &message.created_at,
                    &message.updated_at,
                ),
            )
            .with_context(|| format!("Failed to insert message {}", message.id))?;

        stats.members_added += tx
            .execute(
                "INSERT OR IGNORE INTO community_members (community_id, profile_id, role, joined_at) VALUES (?, ?, ?, ?)",
                (
                    message.community_id.to_string(),
                    &message.author_id,
                    MemberRole::Member.as_str(),
                    &message.created_at,
                ),
            )
            .with_context(|| format!("Failed to enroll author of message {}", message.id))?;
    }

    let converted = plan
        .communities
        .iter()
        .map(|c| c.legacy_id.clone())
        .chain(plan.messages.iter().map(|m| m.legacy_id.clone()));
    for id in converted {
        stats.legacy_rows_removed += tx
            .execute(
                "DELETE FROM community_posts WHERE id = ? AND (instr(title, ?) = 1 OR instr(title, ?) = 1)",
                (&id, METADATA_TAG, MESSAGE_TAG_PREFIX),
            )
            .with_context(|| format!("Failed to remove legacy row {}", id))?;
    }

    if drop_orphans {
        for orphan in &plan.orphans {
            stats.orphans_dropped += tx
                .execute("DELETE FROM community_posts WHERE id = ?", [&orphan.id])
                .with_context(|| format!("Failed to drop orphan {}", orphan.id))?;
        }
    }

    tx.commit().context("Failed to commit migration")?;
    Ok(stats)
}

/// Connect to the database and make sure the community tables exist
fn connect_database(path: &str) -> Result<Database> {
    println!("Connecting to database: {}", path);

    if !std::path::Path::new(path).exists() {
        anyhow::bail!("Database file not found: {}", path);
    }

    let db = Database::new(path).context("Failed to open database connection")?;

    let has_posts: bool = {
        let conn = db.connection().context("Failed to get database connection from pool")?;
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='community_posts'",
            [],
            |row| row.get::<_, i32>(0).map(|count| count > 0),
        )
        .context("Failed to check for community_posts table")?
    };

    if !has_posts {
        anyhow::bail!("Database schema is invalid - community_posts table not found");
    }

    // Older databases predate the community tables
    db.initialize().context("Failed to create community tables")?;

    println!("Database connection successful - schema validated");
    Ok(db)
}

fn display_plan(plan: &MigrationPlan) {
    println!();
    println!("Communities to create: {}", plan.communities.len());
    for community in &plan.communities {
        println!("  - {} ({})", community.name, community.id);
    }
    println!("Messages to convert: {}", plan.messages.len());

    if !plan.orphans.is_empty() {
        println!();
        println!("Orphaned legacy rows: {}", plan.orphans.len());
        for (i, orphan) in plan.orphans.iter().enumerate() {
            println!("  {}. {}: {}", i + 1, orphan.id, orphan.reason);
        }
    }
}

/// Display migration statistics in a formatted way
fn display_stats(stats: &MigrationStats, drop_orphans: bool) {
    println!();
    println!("Migration Summary");
    println!("=================");
    println!();
    println!("Communities created: {}", stats.communities_created);
    println!("Messages created: {}", stats.messages_created);
    println!("Members enrolled: {}", stats.members_added);
    println!("Legacy rows removed: {}", stats.legacy_rows_removed);
    if drop_orphans {
        println!("Orphans dropped: {}", stats.orphans_dropped);
    }
    println!();
    println!("Migration completed successfully!");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cohort_migrate=info".into()),
        )
        .init();

    let args = Args::parse();

    println!("Cohort Legacy Community Migration Utility");
    println!("=========================================");
    println!();
    println!("Database: {}", args.database);
    println!("Dry run: {}", args.dry_run);
    println!("Drop orphans: {}", args.drop_orphans);
    println!();

    let db = connect_database(&args.database)?;

    println!("Querying legacy community rows...");
    let rows = load_legacy_rows(&db)?;
    println!("Found {} legacy rows", rows.len());

    if rows.is_empty() {
        println!("No legacy community rows found - nothing to migrate.");
        return Ok(());
    }

    let plan = plan_migration(&rows, &db)?;
    display_plan(&plan);

    if args.dry_run {
        println!();
        println!("This was a dry run - no changes were made to the database.");
        return Ok(());
    }

    if !args.yes {
        println!();
        println!(
            "This will convert {} communities and {} messages.",
            plan.communities.len(),
            plan.messages.len()
        );
        println!("Do you want to continue? (y/N): ");

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read user input")?;

        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Migration cancelled.");
            return Ok(());
        }
    }

    let stats = apply_plan(&db, &plan, args.drop_orphans)?;
    tracing::info!(
        "Converted {} communities and {} messages",
        stats.communities_created,
        stats.messages_created
    );
    display_stats(&stats, args.drop_orphans);

    Ok(())
}
