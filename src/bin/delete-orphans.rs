use anyhow::Context;
use clap::Parser;
use courseware_api::config::Config;
use courseware_api::content::delete_orphans;
use courseware_api::keys::CourseKey;
use courseware_api::logging::init_logging;
use courseware_api::storage::{InMemoryStorage, Seed};
use std::path::PathBuf;

/// Delete orphans from a course: blocks the course root can no longer reach
#[derive(Parser)]
#[command(name = "delete-orphans")]
struct Args {
    /// Course whose orphans should be deleted (course-v1:org+course+run or org/course/run)
    course_id: String,

    /// Actually delete; without it the orphans are only listed
    #[arg(long)]
    commit: bool,

    /// Store fixture to operate on (overrides config)
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = Config::load()?;
    let _guard = init_logging(&config.logging.dir, "delete-orphans");

    let course: CourseKey = args
        .course_id
        .parse()
        .with_context(|| format!("'{}' is not a course id", args.course_id))?;
    let seed_path = args.seed.unwrap_or(config.store.seed_path);
    let store = InMemoryStorage::from_seed(Seed::load(&seed_path)?)?;

    if !args.commit {
        let orphans = delete_orphans(&store, &course, false).await?;
        println!("Dry run. The following orphans would be deleted (pass --commit to delete):");
        println!("{}", orphans.join("\n"));
        return Ok(());
    }

    println!("Deleting orphans from the course....");
    let deleted = delete_orphans(&store, &course, true).await?;
    store.snapshot()?.save(&seed_path)?;

    println!("Success! Deleted the following orphans from the course:");
    println!("{}", deleted.join("\n"));
    Ok(())
}
