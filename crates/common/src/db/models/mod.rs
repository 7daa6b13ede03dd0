//! SeaORM entity models
//!
//! Database entities for ThesisDesk

mod thesis;
mod user;
mod history;

pub use thesis::{
    Entity as ThesisEntity,
    Model as Thesis,
    ActiveModel as ThesisActiveModel,
    Column as ThesisColumn,
    ThesisChanges,
    ThesisStatus,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};

pub use history::{
    Entity as HistoryEntity,
    Model as History,
    ActiveModel as HistoryActiveModel,
    Column as HistoryColumn,
    NewHistoryEntry,
};
