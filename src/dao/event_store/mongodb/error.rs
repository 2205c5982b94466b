use thiserror::Error;

/// Result alias for MongoDB-backed operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB event store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// A required environment variable is absent.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// Building the client from parsed options failed.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// The initial ping never succeeded within the allowed attempts.
    #[error("MongoDB unreachable after {attempts} ping attempts")]
    InitialPing {
        /// Number of attempts made.
        attempts: u32,
        /// Driver error from the last attempt.
        source: mongodb::error::Error,
    },
    /// A routine health ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Index creation failed during bootstrap.
    #[error("failed to ensure index `{index}` on `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Writing a prediction failed.
    #[error("failed to save prediction `{session_id}`")]
    SavePrediction {
        /// Session the prediction is keyed by.
        session_id: String,
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Reading predictions failed.
    #[error("failed to load predictions")]
    LoadPredictions {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Reading or writing the event config document failed.
    #[error("failed to access the event config document")]
    EventConfig {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Applying a stats delta failed.
    #[error("failed to apply stats update")]
    ApplyStats {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Reading or seeding the gift stock failed.
    #[error("failed to access gift stock")]
    GiftStock {
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// A conditional stock decrement failed at the driver level.
    #[error("failed to decrement stock for gift `{gift_id}`")]
    DecrementStock {
        /// Gift being decremented.
        gift_id: String,
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Writing or deleting a confirmation failed.
    #[error("failed to access confirmation for group `{group_id}`")]
    Confirmation {
        /// Group the confirmation belongs to.
        group_id: String,
        /// Driver error.
        source: mongodb::error::Error,
    },
    /// Listing confirmations failed.
    #[error("failed to list confirmations")]
    ListConfirmations {
        /// Driver error.
        source: mongodb::error::Error,
    },
}
