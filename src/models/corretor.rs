//! Real-estate brokers
//!
//! [`Corretor`] is the typed row of the `corretores` table; [`SiteModel`] opens
//! generic models bound to it.

use active_model::{Database, Entity, Model, ModelError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corretor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub cpf: String,
    pub creci: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Corretor {
    const TABLE: &'static str = "corretores";
}

/// Entry point for models over the brokers table
pub struct SiteModel;

impl SiteModel {
    pub fn new(db: &Database) -> Result<Model, ModelError> {
        Model::new(db, Corretor::TABLE)
    }

    /// Model holding `corretor`, ready to save
    pub fn from_corretor(db: &Database, corretor: &Corretor) -> Result<Model, ModelError> {
        Model::from_entity(db, corretor)
    }
}
