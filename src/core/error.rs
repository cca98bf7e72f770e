use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Combatant not found: {0:?}")]
    CombatantNotFound(crate::core::types::CombatantId),

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
