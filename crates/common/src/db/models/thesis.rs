//! Thesis entity

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review status of a thesis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThesisStatus {
    Pending,
    Approved,
    Rejected,
}

impl ThesisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThesisStatus::Pending => "Pending",
            ThesisStatus::Approved => "Approved",
            ThesisStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ThesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThesisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ThesisStatus::Pending),
            "Approved" => Ok(ThesisStatus::Approved),
            "Rejected" => Ok(ThesisStatus::Rejected),
            other => Err(format!("unknown thesis status: {}", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "theses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    pub keywords: Vec<String>,

    #[sea_orm(column_name = "abstract", column_type = "Text")]
    pub abstract_text: String,

    /// One of `Pending`, `Approved`, `Rejected`
    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub author_id: i64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the status as an enum, if the stored value is recognised
    pub fn thesis_status(&self) -> Option<ThesisStatus> {
        self.status.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Merge-patch over a thesis: `Some` fields overwrite, `None` fields keep the stored value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThesisChanges {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub category: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub abstract_text: Option<String>,
    pub status: Option<ThesisStatus>,
}

impl ThesisChanges {
    /// Apply the patch to a thesis and stamp `updated_at`
    pub fn apply(self, thesis: &mut Model, now: DateTimeWithTimeZone) {
        if let Some(title) = self.title {
            thesis.title = title;
        }
        if let Some(author_id) = self.author_id {
            thesis.author_id = author_id;
        }
        if let Some(category) = self.category {
            thesis.category = category;
        }
        if let Some(keywords) = self.keywords {
            thesis.keywords = keywords;
        }
        if let Some(abstract_text) = self.abstract_text {
            thesis.abstract_text = abstract_text;
        }
        if let Some(status) = self.status {
            thesis.status = status.to_string();
        }
        thesis.updated_at = now;
    }

    /// Active model with only the patched columns and `updated_at` marked `Set`
    pub fn into_active_model(self, thesis: Model, now: DateTimeWithTimeZone) -> ActiveModel {
        let mut active: ActiveModel = thesis.into();

        if let Some(title) = self.title {
            active.title = Set(title);
        }
        if let Some(author_id) = self.author_id {
            active.author_id = Set(author_id);
        }
        if let Some(category) = self.category {
            active.category = Set(category);
        }
        if let Some(keywords) = self.keywords {
            active.keywords = Set(keywords);
        }
        if let Some(abstract_text) = self.abstract_text {
            active.abstract_text = Set(abstract_text);
        }
        if let Some(status) = self.status {
            active.status = Set(status.to_string());
        }
        active.updated_at = Set(now);

        active
    }
}
