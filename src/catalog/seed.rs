//! Sample catalog content for fresh deployments.

use thiserror::Error;
use tracing::info;

use crate::auth::Session;
use crate::catalog::builder::{BuilderError, WorkoutBuilder};
use crate::catalog::gateway::{GatewayError, WorkoutGateway};
use crate::catalog::model::Exercise;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("No exercises found. Seed exercises first.")]
    NoExercises,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

/// Owner of content seeded at startup.
pub fn system_session() -> Session {
    Session {
        user_id: "system".into(),
        display_name: "System".into(),
        email: String::new(),
    }
}

fn exercise(
    name: &str,
    description: &str,
    category: &str,
    muscles: &[&str],
    difficulty: &str,
    equipment: &[&str],
    steps: &[&str],
) -> Exercise {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    Exercise {
        name: name.into(),
        description: description.into(),
        category: category.into(),
        muscle_groups: owned(muscles),
        difficulty: difficulty.into(),
        equipment: owned(equipment),
        instructions: owned(steps),
        ..Default::default()
    }
}

pub fn sample_exercises() -> Vec<Exercise> {
    vec![
        exercise(
            "Push-ups",
            "Classic chest and tricep exercise",
            "Strength",
            &["Chest", "Triceps", "Shoulders"],
            "Beginner",
            &["None"],
            &[
                "Start in plank position with hands shoulder-width apart",
                "Lower your body until chest nearly touches the floor",
                "Push back up to starting position",
                "Keep core engaged throughout",
            ],
        ),
        exercise(
            "Squats",
            "Fundamental lower body exercise",
            "Strength",
            &["Quadriceps", "Glutes", "Hamstrings"],
            "Beginner",
            &["None"],
            &[
                "Stand with feet shoulder-width apart",
                "Lower your hips back and down",
                "Keep chest up and knees tracking over toes",
                "Push through heels to return to standing",
            ],
        ),
        exercise(
            "Plank",
            "Core strengthening hold",
            "Strength",
            &["Core", "Abs", "Back"],
            "Beginner",
            &["None"],
            &[
                "Start in push-up position",
                "Lower onto forearms",
                "Keep body in straight line from head to heels",
                "Hold position, engaging core",
            ],
        ),
        exercise(
            "Burpees",
            "Full body cardio exercise",
            "Cardio",
            &["Full Body"],
            "Intermediate",
            &["None"],
            &[
                "Drop into squat and place hands on floor",
                "Jump feet back into plank position",
                "Do a push-up",
                "Jump feet back to squat",
                "Jump up explosively",
            ],
        ),
        exercise(
            "Dumbbell Bench Press",
            "Upper body strength builder",
            "Strength",
            &["Chest", "Triceps", "Shoulders"],
            "Intermediate",
            &["Dumbbells", "Bench"],
            &[
                "Lie on bench with dumbbells at chest level",
                "Press dumbbells up until arms are extended",
                "Lower with control back to chest level",
                "Keep shoulder blades retracted",
            ],
        ),
        exercise(
            "Deadlifts",
            "Compound posterior chain exercise",
            "Strength",
            &["Back", "Glutes", "Hamstrings"],
            "Advanced",
            &["Barbell"],
            &[
                "Stand with feet hip-width apart, bar over mid-foot",
                "Bend at hips and knees to grip bar",
                "Keep back straight, chest up",
                "Drive through heels to lift bar",
                "Stand fully upright, then lower with control",
            ],
        ),
        exercise(
            "Pull-ups",
            "Upper body pulling exercise",
            "Strength",
            &["Back", "Biceps", "Shoulders"],
            "Intermediate",
            &["Pull-up Bar"],
            &[
                "Hang from bar with palms facing away",
                "Pull yourself up until chin is over bar",
                "Lower with control to full extension",
                "Keep core engaged",
            ],
        ),
        exercise(
            "Mountain Climbers",
            "Dynamic cardio and core exercise",
            "Cardio",
            &["Core", "Shoulders", "Legs"],
            "Beginner",
            &["None"],
            &[
                "Start in plank position",
                "Drive one knee toward chest",
                "Quickly switch legs",
                "Continue alternating at fast pace",
            ],
        ),
        exercise(
            "Jumping Jacks",
            "Classic cardio warmup",
            "Cardio",
            &["Full Body"],
            "Beginner",
            &["None"],
            &[
                "Stand with feet together, arms at sides",
                "Jump feet apart while raising arms overhead",
                "Jump back to starting position",
                "Maintain steady rhythm",
            ],
        ),
    ]
}

pub async fn seed_exercises(
    gateway: &WorkoutGateway,
    session: Option<&Session>,
) -> Result<usize, SeedError> {
    let samples = sample_exercises();
    let count = samples.len();
    for exercise in samples {
        gateway.create_exercise(session, exercise).await?;
    }
    info!(count, "sample exercises seeded");
    Ok(count)
}

/// Builds "Beginner Strength" from up to three Strength exercises.
pub async fn seed_workouts(
    gateway: &WorkoutGateway,
    session: Option<&Session>,
) -> Result<String, SeedError> {
    let strength = gateway.list_exercises_by_category("Strength").await;
    if strength.is_empty() {
        return Err(SeedError::NoExercises);
    }

    let mut builder = WorkoutBuilder::new();
    builder.name = "Beginner Strength".into();
    builder.description = "A great starting workout for building muscle.".into();
    builder.category = "Strength".into();
    builder.difficulty = "Beginner".into();
    builder.duration_minutes = 30;
    for exercise in strength.iter().take(3) {
        builder.add_from_catalog(exercise);
    }
    let id = builder.commit(gateway, session).await?;
    info!(workout_id = %id, "sample workout seeded");
    Ok(id)
}

/// Seeds both collections unless public exercises already exist.
pub async fn seed_if_empty(gateway: &WorkoutGateway) -> Result<(), SeedError> {
    if !gateway.list_public_exercises().await.is_empty() {
        info!("catalog already has exercises; skipping seed");
        return Ok(());
    }
    let session = system_session();
    seed_exercises(gateway, Some(&session)).await?;
    seed_workouts(gateway, Some(&session)).await?;
    Ok(())
}
