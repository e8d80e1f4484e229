use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::admin::{AdminEditor, AdminError};
use crate::auth::{AuthError, Authenticator, Session, is_admin, record_login};
use crate::export::export_standings;
use crate::fixtures::Fixture;
use crate::news::{NEWS_COLLECTION, NewsItem};
use crate::roster::{parse_roster, team_doc_id};
use crate::state::{Delta, ProviderCommand, RosterTarget, SessionInfo};
use crate::store::{CollectionPath, DivisionCollection, DocumentStore, StoreError};

/// Everything the provider thread talks to.
#[derive(Clone)]
pub struct ProviderContext {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn Authenticator>,
    pub app_id: String,
}

/// Services [`ProviderCommand`]s until the command sender is dropped.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, ctx: ProviderContext) {
    thread::spawn(move || {
        let mut provider = Provider {
            ctx,
            tx,
            session: None,
        };
        for cmd in cmd_rx {
            provider.handle(cmd);
        }
        tracing::debug!("provider command channel closed");
    });
}

struct Provider {
    ctx: ProviderContext,
    tx: Sender<Delta>,
    session: Option<Session>,
}

impl Provider {
    fn send(&self, delta: Delta) {
        let _ = self.tx.send(delta);
    }

    fn info(&self, msg: String) {
        tracing::info!("{msg}");
        self.send(Delta::Log(format!("[INFO] {msg}")));
    }

    fn warn(&self, msg: String) {
        tracing::warn!("{msg}");
        self.send(Delta::Log(format!("[WARN] {msg}")));
    }

    fn handle(&mut self, cmd: ProviderCommand) {
        match cmd {
            ProviderCommand::FetchFixtures { state, division } => {
                self.fetch_fixtures(&state, &division)
            }
            ProviderCommand::FetchNews => self.fetch_news(),
            ProviderCommand::FetchRoster { target } => self.fetch_roster(target),
            ProviderCommand::SignInAnonymously => {
                let result = self.ctx.auth.sign_in_anonymously();
                self.finish_sign_in(result);
            }
            ProviderCommand::SignIn { email, password } => {
                let result = self.ctx.auth.sign_in_with_password(&email, &password);
                self.finish_sign_in(result);
            }
            ProviderCommand::AddNews { item } => {
                let result = self.with_editor(|editor| editor.add_news(&item));
                match result {
                    Ok(id) => {
                        self.info(format!("News posted: {} ({id})", item.title));
                        self.fetch_news();
                    }
                    Err(err) => self.warn(format!("Add news failed: {err}")),
                }
            }
            ProviderCommand::DeleteNews { id } => {
                match self.with_editor(|editor| editor.delete_news(&id)) {
                    Ok(()) => {
                        self.info(format!("News deleted: {id}"));
                        self.fetch_news();
                    }
                    Err(err) => self.warn(format!("Delete news failed: {err}")),
                }
            }
            ProviderCommand::AddFixture { fixture } => {
                match self.with_editor(|editor| editor.add_fixture(&fixture)) {
                    Ok(_) => {
                        self.info(format!(
                            "Fixture added: {} vs {}",
                            fixture.home_team, fixture.away_team
                        ));
                        self.fetch_fixtures(&fixture.state, &fixture.division);
                    }
                    Err(err) => self.warn(format!("Add fixture failed: {err}")),
                }
            }
            ProviderCommand::AddTeam {
                state,
                division,
                team,
            } => match self.with_editor(|editor| editor.add_team(&state, &division, &team)) {
                Ok(()) => self.info(format!("Team saved: {}", team.team_name)),
                Err(err) => self.warn(format!("Save team failed: {err}")),
            },
            ProviderCommand::DeleteTeam {
                state,
                division,
                doc_id,
                team,
            } => match self.with_editor(|editor| editor.delete_team(&state, &division, &doc_id)) {
                Ok(()) => self.info(format!("Team deleted: {team}")),
                Err(err) => self.warn(format!("Delete team failed: {err}")),
            },
            ProviderCommand::SaveRoster { target, players } => match self.with_editor(|editor| {
                editor.save_roster(&target.state, &target.division, &target.team, &players)
            }) {
                Ok(()) => {
                    self.info(format!(
                        "Roster saved: {} ({} players)",
                        target.team,
                        players.len()
                    ));
                    self.send(Delta::SetRoster { target, players });
                }
                Err(err) => self.warn(format!("Save roster failed: {err}")),
            },
            ProviderCommand::ExportStandings { path, table } => {
                match export_standings(&path, &table) {
                    Ok(rows) => self.info(format!("Exported {rows} rows to {}", path.display())),
                    Err(err) => self.warn(format!("Export failed: {err:#}")),
                }
            }
        }
    }

    fn with_editor<T>(
        &self,
        op: impl FnOnce(&AdminEditor<'_>) -> Result<T, AdminError>,
    ) -> Result<T, AdminError> {
        let session = self.session.as_ref().ok_or(AdminError::NotAdmin)?;
        let editor = AdminEditor::require(self.ctx.store.as_ref(), session, &self.ctx.app_id)?;
        op(&editor)
    }

    fn finish_sign_in(&mut self, result: Result<Session, AuthError>) {
        let session = match result {
            Ok(session) => session,
            Err(err) => {
                self.warn(format!("Sign-in failed: {err}"));
                return;
            }
        };
        self.ctx.store.set_session_token(session.id_token.clone());
        if let Err(err) = record_login(self.ctx.store.as_ref(), &session) {
            // Logins still succeed when the users collection is read-only.
            tracing::debug!(uid = %session.uid, "record login failed: {err}");
        }
        let admin = match is_admin(self.ctx.store.as_ref(), session.email.as_deref()) {
            Ok(admin) => admin,
            Err(err) => {
                self.warn(format!("Admin check failed: {err}"));
                false
            }
        };
        self.send(Delta::SetSession(SessionInfo {
            email: session.email.clone(),
            anonymous: session.anonymous,
            admin,
        }));
        self.session = Some(session);
    }

    fn fetch_fixtures(&self, state: &str, division: &str) {
        let path =
            CollectionPath::division(&self.ctx.app_id, state, division, DivisionCollection::Fixtures);
        match self.ctx.store.list(&path) {
            Ok(docs) => {
                let fixtures = docs.iter().map(Fixture::from_document).collect();
                self.send(Delta::SetFixtures(fixtures));
            }
            Err(err) => self.send(Delta::FixturesFailed(describe(&err))),
        }
    }

    fn fetch_news(&self) {
        let path = CollectionPath::app_data(&self.ctx.app_id, NEWS_COLLECTION);
        match self.ctx.store.list(&path) {
            Ok(docs) => {
                let items = docs.iter().map(NewsItem::from_document).collect();
                self.send(Delta::SetNews(items));
            }
            Err(err) => self.send(Delta::NewsFailed(describe(&err))),
        }
    }

    fn fetch_roster(&self, target: RosterTarget) {
        let path = CollectionPath::division(
            &self.ctx.app_id,
            &target.state,
            &target.division,
            DivisionCollection::Teams,
        );
        match self.ctx.store.get(&path, &team_doc_id(&target.team)) {
            Ok(doc) => {
                let players = doc.map(|d| parse_roster(&d.fields)).unwrap_or_default();
                self.send(Delta::SetRoster { target, players });
            }
            Err(err) => self.send(Delta::RosterFailed(describe(&err))),
        }
    }
}

fn describe(err: &StoreError) -> String {
    match err {
        StoreError::PermissionDenied(_) | StoreError::Unauthenticated => {
            format!("{err} (sign in first)")
        }
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::auth::SampleAuth;
    use crate::sample::{SAMPLE_ADMIN_EMAIL, SAMPLE_ADMIN_PASSWORD, sample_accounts, seed_store};
    use crate::store::MemoryStore;

    const APP: &str = "sample-app";

    fn start() -> (mpsc::Sender<ProviderCommand>, mpsc::Receiver<Delta>) {
        let store = MemoryStore::new();
        seed_store(&store, APP);
        let ctx = ProviderContext {
            store: Arc::new(store),
            auth: Arc::new(SampleAuth::new(sample_accounts())),
            app_id: APP.to_string(),
        };
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        spawn_provider(tx, cmd_rx, ctx);
        (cmd_tx, rx)
    }

    fn next_matching(rx: &mpsc::Receiver<Delta>, pred: impl Fn(&Delta) -> bool) -> Delta {
        loop {
            let delta = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("provider delta");
            if pred(&delta) {
                return delta;
            }
        }
    }

    #[test]
    fn anonymous_session_is_not_admin() {
        let (cmd_tx, rx) = start();
        cmd_tx.send(ProviderCommand::SignInAnonymously).unwrap();
        match next_matching(&rx, |d| matches!(d, Delta::SetSession(_))) {
            Delta::SetSession(info) => {
                assert!(info.anonymous);
                assert!(!info.admin);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn admin_sign_in_unlocks_news_writes() {
        let (cmd_tx, rx) = start();
        cmd_tx
            .send(ProviderCommand::SignIn {
                email: SAMPLE_ADMIN_EMAIL.to_string(),
                password: SAMPLE_ADMIN_PASSWORD.to_string(),
            })
            .unwrap();
        match next_matching(&rx, |d| matches!(d, Delta::SetSession(_))) {
            Delta::SetSession(info) => assert!(info.admin),
            _ => unreachable!(),
        }

        let item = NewsItem {
            title: "Final moved".to_string(),
            content: "Kick-off at 18:00".to_string(),
            ..NewsItem::default()
        };
        cmd_tx.send(ProviderCommand::AddNews { item }).unwrap();
        match next_matching(&rx, |d| matches!(d, Delta::SetNews(_))) {
            Delta::SetNews(items) => {
                let posted = items
                    .iter()
                    .find(|n| n.title == "Final moved")
                    .expect("posted item");
                assert_eq!(posted.author, "Admin");
                assert!(!posted.date.is_empty());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn writes_without_admin_are_refused() {
        let (cmd_tx, rx) = start();
        cmd_tx.send(ProviderCommand::SignInAnonymously).unwrap();
        cmd_tx
            .send(ProviderCommand::DeleteNews {
                id: "news-1".to_string(),
            })
            .unwrap();
        match next_matching(&rx, |d| matches!(d, Delta::Log(msg) if msg.starts_with("[WARN]"))) {
            Delta::Log(msg) => assert!(msg.contains("not an administrator"), "{msg}"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn wrong_password_keeps_previous_session() {
        let (cmd_tx, rx) = start();
        cmd_tx
            .send(ProviderCommand::SignIn {
                email: SAMPLE_ADMIN_EMAIL.to_string(),
                password: "nope".to_string(),
            })
            .unwrap();
        match next_matching(&rx, |d| matches!(d, Delta::Log(_))) {
            Delta::Log(msg) => assert!(msg.contains("Sign-in failed"), "{msg}"),
            _ => unreachable!(),
        }
    }
}
