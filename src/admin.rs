use chrono::Utc;
use thiserror::Error;

use crate::auth::{Session, is_admin};
use crate::fixtures::Fixture;
use crate::news::{NEWS_COLLECTION, NewsItem};
use crate::record::TeamRecord;
use crate::roster::{Player, roster_fields, team_doc_id};
use crate::store::{CollectionPath, DivisionCollection, DocumentStore, StoreError};

pub const DEFAULT_AUTHOR: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("not an administrator")]
    NotAdmin,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write access, only obtainable for an identity that passes the admin
/// predicate.
pub struct AdminEditor<'a> {
    store: &'a dyn DocumentStore,
    app_id: String,
    email: String,
}

impl<'a> AdminEditor<'a> {
    pub fn verify(
        store: &'a dyn DocumentStore,
        session: &Session,
        app_id: &str,
    ) -> Result<Option<Self>, AdminError> {
        let Some(email) = session.email.clone() else {
            return Ok(None);
        };
        if !is_admin(store, Some(&email))? {
            return Ok(None);
        }
        Ok(Some(Self {
            store,
            app_id: app_id.to_string(),
            email,
        }))
    }

    /// Like [`AdminEditor::verify`] but a non-admin is an error.
    pub fn require(
        store: &'a dyn DocumentStore,
        session: &Session,
        app_id: &str,
    ) -> Result<Self, AdminError> {
        Self::verify(store, session, app_id)?.ok_or(AdminError::NotAdmin)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Team documents are keyed by team name.
    pub fn add_team(&self, state: &str, division: &str, team: &TeamRecord) -> Result<(), AdminError> {
        let name = team.team_name.trim();
        if name.is_empty() {
            return Err(AdminError::Invalid("team name is required".to_string()));
        }
        let path = CollectionPath::division(&self.app_id, state, division, DivisionCollection::Rankings);
        self.store.merge(&path, name, team.to_fields())?;
        Ok(())
    }

    /// Deletes by document id, which may differ from the displayed name
    /// (`Golden_Lions` vs "Golden Lions").
    pub fn delete_team(&self, state: &str, division: &str, doc_id: &str) -> Result<(), AdminError> {
        let path = CollectionPath::division(&self.app_id, state, division, DivisionCollection::Rankings);
        if self.store.get(&path, doc_id)?.is_none() {
            return Err(AdminError::Invalid(format!("no team document {doc_id}")));
        }
        self.store.delete(&path, doc_id)?;
        Ok(())
    }

    pub fn add_fixture(&self, fixture: &Fixture) -> Result<String, AdminError> {
        if fixture.home_team.trim().is_empty() || fixture.away_team.trim().is_empty() {
            return Err(AdminError::Invalid("both teams are required".to_string()));
        }
        if fixture.state.trim().is_empty() || fixture.division.trim().is_empty() {
            return Err(AdminError::Invalid("state and division are required".to_string()));
        }
        let path = CollectionPath::division(
            &self.app_id,
            &fixture.state,
            &fixture.division,
            DivisionCollection::Fixtures,
        );
        Ok(self.store.create(&path, None, fixture.to_fields())?)
    }

    /// Stamps the date (now) and author before writing.
    pub fn add_news(&self, item: &NewsItem) -> Result<String, AdminError> {
        if item.title.trim().is_empty() {
            return Err(AdminError::Invalid("title is required".to_string()));
        }
        let mut item = item.clone();
        item.date = Utc::now().to_rfc3339();
        if item.author.trim().is_empty() {
            item.author = DEFAULT_AUTHOR.to_string();
        }
        let path = CollectionPath::app_data(&self.app_id, NEWS_COLLECTION);
        Ok(self.store.create(&path, None, item.to_fields())?)
    }

    pub fn delete_news(&self, id: &str) -> Result<(), AdminError> {
        let path = CollectionPath::app_data(&self.app_id, NEWS_COLLECTION);
        self.store.delete(&path, id)?;
        Ok(())
    }

    pub fn save_roster(
        &self,
        state: &str,
        division: &str,
        team_name: &str,
        players: &[Player],
    ) -> Result<(), AdminError> {
        let path = CollectionPath::division(&self.app_id, state, division, DivisionCollection::Teams);
        self.store
            .merge(&path, &team_doc_id(team_name), roster_fields(players))?;
        Ok(())
    }
}
