use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use liftlog_core::validation;
use liftlog_core::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout tracking with automatic weight progression", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

/// A JSON request body, given inline or as a file
#[derive(Args)]
struct BodyArgs {
    /// JSON body inline
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to a JSON body file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl BodyArgs {
    fn read(&self) -> Result<Option<String>> {
        match (&self.json, &self.file) {
            (Some(json), _) => Ok(Some(json.clone())),
            (None, Some(path)) => Ok(Some(std::fs::read_to_string(path)?)),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a workout with its exercises ({"name": ..., "exercises": [...]})
    Create {
        #[arg(long)]
        user: i64,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// List a user's workouts
    Workouts {
        #[arg(long)]
        user: i64,
    },

    /// Show a single workout
    Workout {
        #[arg(long)]
        id: i64,
    },

    /// List a workout's exercises
    Exercises {
        #[arg(long)]
        workout: i64,
    },

    /// Rename a workout and/or replace its exercises
    Update {
        #[arg(long)]
        workout: i64,

        /// New name (overrides any name in the body)
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// Delete a workout and everything recorded under it
    Delete {
        #[arg(long)]
        workout: i64,
    },

    /// Record a completed set
    LogSet {
        #[arg(long)]
        exercise: i64,

        #[arg(long)]
        weight: f64,

        #[arg(long)]
        reps: i64,
    },

    /// List every set recorded for an exercise
    Sets {
        #[arg(long)]
        exercise: i64,
    },

    /// Show the recent sets of the user's newest workout
    Summary {
        #[arg(long)]
        user: i64,

        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// List exercises that qualify for a weight increase
    Eligible {
        #[arg(long)]
        user: i64,
    },

    /// Increase the working weight of the given exercises
    Progress {
        /// Exercise ids
        #[arg(required = true)]
        exercise_ids: Vec<i64>,

        /// Re-check eligibility before applying
        #[arg(long)]
        verify: bool,
    },

    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Destination (defaults to the standard config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; warn keeps the JSON on stdout uncluttered
    liftlog_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config.data.database_path = db;
    }

    if let Commands::InitConfig { path, force } = &cli.command {
        return cmd_init_config(&config, path.clone(), *force);
    }

    let store = Store::open(&config.data.database_path)?;

    match cli.command {
        Commands::Create { user, body } => cmd_create(&store, user, &body),
        Commands::Workouts { user } => print_json(&store.list_workouts(user)?),
        Commands::Workout { id } => print_json(&store.get_workout(id)?),
        Commands::Exercises { workout } => print_json(&store.list_exercises(workout)?),
        Commands::Update {
            workout,
            name,
            body,
        } => cmd_update(&store, workout, name, &body),
        Commands::Delete { workout } => {
            store.delete_workout(workout)?;
            println!("✓ Workout {} deleted", workout);
            Ok(())
        }
        Commands::LogSet {
            exercise,
            weight,
            reps,
        } => cmd_log_set(&store, exercise, weight, reps),
        Commands::Sets { exercise } => print_json(&store.list_sets(exercise)?),
        Commands::Summary { user, csv } => cmd_summary(&store, user, csv),
        Commands::Eligible { user } => print_json(&store.eligible_exercises(user)?),
        Commands::Progress {
            exercise_ids,
            verify,
        } => cmd_progress(&store, exercise_ids, verify),
        Commands::InitConfig { .. } => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_create(store: &Store, user: i64, body: &BodyArgs) -> Result<()> {
    let raw = body
        .read()?
        .ok_or_else(|| Error::Validation("create needs --json or --file".into()))?;
    let workout: NewWorkout = serde_json::from_str(&raw)?;
    validation::validate_new_workout(&workout)?;

    let workout_id = store.create_workout(user, &workout.name, &workout.exercises)?;
    println!(
        "✓ Created workout {} with {} exercises",
        workout_id,
        workout.exercises.len()
    );
    Ok(())
}

fn cmd_update(store: &Store, workout: i64, name: Option<String>, body: &BodyArgs) -> Result<()> {
    let mut update: WorkoutUpdate = match body.read()? {
        Some(raw) => serde_json::from_str(&raw)?,
        None => WorkoutUpdate::default(),
    };
    if name.is_some() {
        update.name = name;
    }
    validation::validate_update(&update)?;

    store.update_workout(workout, &update)?;
    println!("✓ Workout {} updated", workout);
    Ok(())
}

fn cmd_log_set(store: &Store, exercise: i64, weight: f64, reps: i64) -> Result<()> {
    validation::validate_new_set(&NewSet { weight, reps })?;
    let set_id = store.record_set(exercise, weight, reps)?;
    println!("✓ Logged set {}: {} x {}", set_id, weight, reps);
    Ok(())
}

fn cmd_summary(store: &Store, user: i64, csv: bool) -> Result<()> {
    let rows = store.workout_summary(user)?;
    if csv {
        write_summary_csv(&rows, std::io::stdout().lock())
    } else {
        print_json(&rows)
    }
}

fn cmd_progress(store: &Store, exercise_ids: Vec<i64>, verify: bool) -> Result<()> {
    let request = ProgressionRequest {
        exercise_ids,
        verify,
    };
    validation::validate_progression_request(&request)?;

    let updated = if request.verify {
        store.apply_progression_verified(&request.exercise_ids, Utc::now())?
    } else {
        store.apply_progression(&request.exercise_ids)?
    };

    for exercise in &updated {
        println!(
            "✓ {} → {} (+{})",
            exercise.name, exercise.current_weight, exercise.weight_modifier
        );
    }
    tracing::debug!("Progressed {} exercises", updated.len());
    Ok(())
}

fn cmd_init_config(config: &Config, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::default_config_path);
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{:?} already exists (use --force to overwrite)",
            path
        )));
    }

    config.save_to(&path)?;
    println!("✓ Wrote config to {}", path.display());
    Ok(())
}
