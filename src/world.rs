//! Row types read from the benchmark tables.

use serde::Serialize;
use sqlx::FromRow;

/// Lowest id present in the `World` table.
pub const MIN_ID: i32 = 1;

/// Highest id present in the `World` table. Rows `1..=MAX_ID` are seeded
/// by an external fixture before the service starts.
pub const MAX_ID: i32 = 10_000;

/// One row of the `World` table.
///
/// `World::default()` is the zero-valued row handed out when a read misses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromRow, Serialize)]
pub struct World {
    pub id: i32,
    #[serde(rename = "randomNumber")]
    #[sqlx(rename = "randomnumber")]
    pub random_number: i32,
}

impl World {
    pub fn new(id: i32, random_number: i32) -> Self {
        Self { id, random_number }
    }
}

/// One row of the `Fortune` table.
#[derive(Clone, Debug, Eq, PartialEq, FromRow, Serialize)]
pub struct Fortune {
    pub id: i32,
    pub message: String,
}

impl Fortune {
    pub fn new(id: i32, message: impl Into<String>) -> Self {
        Self { id, message: message.into() }
    }
}
