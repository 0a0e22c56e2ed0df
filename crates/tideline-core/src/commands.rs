use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use chrono::Utc;
use tideline_shared::{HabitUpsert, NoteUpsert, TagUpsert, TaskCreate, TaskPatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api;
use crate::cli::{Command, HabitsCommand, MoodsCommand, NotesCommand, TagsCommand, TaskAddArgs, TasksCommand};
use crate::error::ApiError;
use crate::features::{HabitBoard, TaskBoard, TaskFilter, TaskTab};
use crate::http::{ApiClient, Transport};
use crate::notifier::NotifierState;
use crate::optimistic::{Keyed, Outcome, ViewState};
use crate::render::Renderer;
use crate::session::SessionContext;
use crate::watchdog::{Navigator, SessionWatchdog, WatchdogSettings};

/// Everything a command needs, built once per invocation.
pub struct App<T> {
    pub client: ApiClient<T>,
    pub renderer: Renderer,
    pub watchdog: WatchdogSettings,
    pub navigator: Arc<dyn Navigator>,
}

/// Leaving for the login screen, as a terminal can: say so and stop.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, target: &str) {
        debug!(target, "terminal redirect");
        eprintln!("Signed out. Run `tideline login <username>` to start a new session.");
    }
}

#[instrument(skip(app))]
pub async fn dispatch<T>(app: &App<T>, command: Command) -> anyhow::Result<()>
where
    T: Transport + Clone + 'static,
{
    if !command.needs_session() {
        return run_local(app, command).await;
    }

    let session = app.client.session().clone();
    if !session.is_logged_in() {
        bail!("not logged in; run `tideline login <username>` first");
    }

    let notices = spawn_notices(session.subscribe());
    let watchdog = SessionWatchdog::new(
        session.clone(),
        app.watchdog.clone(),
        Arc::clone(&app.navigator),
    )
    .spawn();

    let watching = matches!(command, Command::Watch);
    let result = if watching {
        watch_session(&session).await
    } else {
        run_remote(app, command).await
    };

    if !session.notifier().has_fired() {
        watchdog.stop().await;
        notices.abort();
        return result;
    }

    info!("session expired during command; waiting for redirect");
    watchdog.finished().await;
    if let Err(err) = notices.await {
        warn!(error = %err, "expiry notice task failed");
    }

    match result {
        Err(err) => Err(err),
        Ok(()) if watching => Ok(()),
        Ok(()) => Err(ApiError::SessionExpired.into()),
    }
}

async fn run_local<T: Transport>(app: &App<T>, command: Command) -> anyhow::Result<()> {
    let client = &app.client;
    match command {
        Command::Login { identifier, password } => {
            let password = read_password(password)?;
            api::auth::login(client, &identifier, &password)
                .await
                .map_err(|err| credentials_error(err, "login failed"))?;
            println!("Logged in as {}.", greeting_name(client.session(), &identifier));
            Ok(())
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let password = read_password(password)?;
            api::auth::signup(client, &username, &email, &password)
                .await
                .map_err(|err| credentials_error(err, "signup failed"))?;
            println!("Welcome, {}.", greeting_name(client.session(), &username));
            Ok(())
        }
        Command::Logout => {
            api::auth::logout(client)?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => match client.session().claims() {
            Some(claims) => app.renderer.write_whoami(io::stdout(), &claims, Utc::now()),
            None if client.session().is_logged_in() => {
                bail!("stored token is unreadable; log in again")
            }
            None => {
                println!("Not logged in.");
                Ok(())
            }
        },
        other => Err(anyhow!("{other:?} needs a session")),
    }
}

async fn run_remote<T>(app: &App<T>, command: Command) -> anyhow::Result<()>
where
    T: Transport + Clone,
{
    match command {
        Command::Tasks(sub) => tasks(app, sub).await,
        Command::Habits(sub) => habits(app, sub).await,
        Command::Tags(sub) => tags(app, sub).await,
        Command::Moods(sub) => moods(app, sub).await,
        Command::Notes(sub) => notes(app, sub).await,
        other => Err(anyhow!("{other:?} does not talk to the backend")),
    }
}

#[instrument(skip(app))]
async fn tasks<T: Transport + Clone>(app: &App<T>, command: TasksCommand) -> anyhow::Result<()> {
    let board = TaskBoard::new(app.client.clone());
    let today = Utc::now().date_naive();

    match command {
        TasksCommand::List { tab, priority, search } => {
            board.set_filter(TaskFilter { priority, search });
            let (refreshed, tags) = tokio::join!(board.refresh(tab), api::tags::list_or_empty(&app.client));
            refreshed.map_err(|err| surfaced(board.view(), err))?;
            app.renderer.write_tasks(io::stdout(), &board.tasks(), today)?;
            if !tags.is_empty() {
                let names: Vec<String> = tags.iter().map(|tag| format!("#{}", tag.name)).collect();
                println!("\ntags: {}", names.join(" "));
            }
            Ok(())
        }
        TasksCommand::Show { id } => {
            let task = api::tasks::get(&app.client, id).await.context("Failed to load task")?;
            app.renderer.write_task(io::stdout(), &task)
        }
        TasksCommand::Add(TaskAddArgs {
            title,
            description,
            priority,
            due,
        }) => {
            let create = TaskCreate {
                title,
                description: description.filter(|text| !text.trim().is_empty()),
                priority,
                due_date: due,
            };
            match board.create(create).await.map_err(|err| surfaced(board.view(), err))? {
                Outcome::Unchanged => bail!("task title cannot be empty"),
                _ => match board.view().error() {
                    Some(message) => {
                        println!("Task created. {message}.");
                        Ok(())
                    }
                    None => app.renderer.write_tasks(io::stdout(), &board.tasks(), today),
                },
            }
        }
        TasksCommand::Done { id } => set_complete(&board, id, true).await,
        TasksCommand::Undo { id } => set_complete(&board, id, false).await,
        TasksCommand::Rename { id, title } => {
            load_tasks(&board).await?;
            match board.rename(id, &title).await.map_err(|err| surfaced(board.view(), err))? {
                Outcome::Unchanged => println!("Nothing to change."),
                outcome => {
                    expect_applied(outcome, id)?;
                    println!("Renamed task {id}.");
                }
            }
            Ok(())
        }
        TasksCommand::Edit {
            id,
            title,
            description,
            priority,
            due,
        } => {
            load_tasks(&board).await?;
            let wanted = TaskPatch {
                title,
                description,
                priority,
                due_date: due,
            };
            match board.edit(id, wanted).await.map_err(|err| surfaced(board.view(), err))? {
                Outcome::Unchanged => println!("Nothing to change."),
                outcome => {
                    expect_applied(outcome, id)?;
                    let task = board.view().get(id).ok_or_else(|| anyhow!("no task with id {id}"))?;
                    app.renderer.write_task(io::stdout(), &task)?;
                }
            }
            Ok(())
        }
        TasksCommand::Archive { id } => {
            expect_applied(
                board.archive(id).await.map_err(|err| surfaced(board.view(), err))?,
                id,
            )?;
            println!("Archived task {id}.");
            Ok(())
        }
        TasksCommand::Delete { id } => {
            expect_applied(
                board.delete(id).await.map_err(|err| surfaced(board.view(), err))?,
                id,
            )?;
            println!("Deleted task {id}.");
            Ok(())
        }
    }
}

async fn set_complete<T: Transport>(board: &TaskBoard<T>, id: i64, complete: bool) -> anyhow::Result<()> {
    load_tasks(board).await?;
    let task = board.view().get(id).ok_or_else(|| anyhow!("no task with id {id}"))?;
    if task.is_complete == complete {
        println!("Task {id} is already {}.", if complete { "complete" } else { "open" });
        return Ok(());
    }

    expect_applied(
        board.toggle_complete(id).await.map_err(|err| surfaced(board.view(), err))?,
        id,
    )?;
    let verb = if complete { "Completed" } else { "Reopened" };
    println!("{verb} task {id}.");
    Ok(())
}

/// Open and completed tasks, which is what the mutating commands act on.
async fn load_tasks<T: Transport>(board: &TaskBoard<T>) -> anyhow::Result<()> {
    board
        .refresh(TaskTab::Active)
        .await
        .map(|_| ())
        .map_err(|err| surfaced(board.view(), err))
}

#[instrument(skip(app))]
async fn habits<T: Transport + Clone>(app: &App<T>, command: HabitsCommand) -> anyhow::Result<()> {
    let board = HabitBoard::new(app.client.clone());

    match command {
        HabitsCommand::List => {
            board.load().await.map_err(|err| surfaced(board.view(), err))?;
            app.renderer.write_habits(io::stdout(), &board.habits())
        }
        HabitsCommand::Add { name, description } => {
            match board
                .create(&name, description)
                .await
                .map_err(|err| surfaced(board.view(), err))?
            {
                Outcome::Unchanged => bail!("habit name cannot be empty"),
                _ => app.renderer.write_habits(io::stdout(), &board.habits()),
            }
        }
        HabitsCommand::Check { id } => {
            board.load().await.map_err(|err| surfaced(board.view(), err))?;
            expect_applied(
                board.toggle_check(id).await.map_err(|err| surfaced(board.view(), err))?,
                id,
            )?;
            let habit = board.view().get(id).ok_or_else(|| anyhow!("no habit with id {id}"))?;
            if habit.checked_today {
                println!("Checked in to {}: {} day streak.", habit.name, habit.current_streak);
            } else {
                println!("Check-in for {} undone.", habit.name);
            }
            Ok(())
        }
        HabitsCommand::Edit { id, name, description } => {
            let current = api::habits::get(&app.client, id)
                .await
                .context("Failed to load habit")?;
            let payload = HabitUpsert {
                name: non_blank(name).unwrap_or(current.name),
                description: description.or(current.description),
                intent: current.intent,
                affirmation: current.affirmation,
                color: current.color,
                icon: current.icon,
                frequency: current.frequency,
            };
            let updated = api::habits::update(&app.client, id, &payload)
                .await
                .context("Failed to update habit")?;
            println!("Updated habit {}.", updated.name);
            Ok(())
        }
        HabitsCommand::Delete { id } => {
            expect_applied(
                board.delete(id).await.map_err(|err| surfaced(board.view(), err))?,
                id,
            )?;
            println!("Deleted habit {id}.");
            Ok(())
        }
    }
}

async fn tags<T: Transport>(app: &App<T>, command: TagsCommand) -> anyhow::Result<()> {
    let client = &app.client;
    match command {
        TagsCommand::List => {
            let tags = api::tags::list(client).await.context("Failed to load tags")?;
            app.renderer.write_tags(io::stdout(), &tags)
        }
        TagsCommand::Add { name, color } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("tag name cannot be empty");
            }
            let tag = api::tags::create(client, &TagUpsert { name, color })
                .await
                .context("Failed to create tag")?;
            println!("Created tag {} ({}).", tag.name, tag.id);
            Ok(())
        }
        TagsCommand::Edit { id, name, color } => {
            let current = api::tags::list(client)
                .await
                .context("Failed to load tags")?
                .into_iter()
                .find(|tag| tag.id == id)
                .ok_or_else(|| anyhow!("no tag with id {id}"))?;
            let payload = TagUpsert {
                name: non_blank(name).unwrap_or(current.name),
                color: color.or(current.color),
            };
            let tag = api::tags::update(client, id, &payload)
                .await
                .context("Failed to update tag")?;
            println!("Updated tag {}.", tag.name);
            Ok(())
        }
        TagsCommand::Delete { id } => {
            api::tags::delete(client, id).await.context("Failed to delete tag")?;
            println!("Deleted tag {id}.");
            Ok(())
        }
    }
}

async fn moods<T: Transport>(app: &App<T>, command: MoodsCommand) -> anyhow::Result<()> {
    let client = &app.client;
    match command {
        MoodsCommand::List => {
            let entries = api::moods::list(client).await.context("Failed to load moods")?;
            app.renderer.write_moods(io::stdout(), &entries)
        }
        MoodsCommand::Add { mood, note } => {
            api::moods::create(client, &mood, note).await?;
            println!("Mood recorded.");
            Ok(())
        }
    }
}

async fn notes<T: Transport>(app: &App<T>, command: NotesCommand) -> anyhow::Result<()> {
    let client = &app.client;
    match command {
        NotesCommand::List => {
            let notes = api::notes::list(client).await.context("Failed to load notes")?;
            app.renderer.write_notes(io::stdout(), &notes)
        }
        NotesCommand::Show { id } => {
            let note = api::notes::get(client, id).await.context("Failed to load note")?;
            app.renderer.write_note(io::stdout(), &note)
        }
        NotesCommand::Add { title, content } => {
            let title = title.trim().to_string();
            if title.is_empty() {
                bail!("note title cannot be empty");
            }
            let note = api::notes::create(client, &NoteUpsert { title, content })
                .await
                .context("Failed to save note")?;
            println!("Saved note {}.", note.id);
            Ok(())
        }
        NotesCommand::Edit { id, title, content } => {
            let current = api::notes::get(client, id).await.context("Failed to load note")?;
            let payload = NoteUpsert {
                title: non_blank(title).unwrap_or(current.title),
                content: content.or(current.content).unwrap_or_default(),
            };
            let note = api::notes::update(client, id, &payload)
                .await
                .context("Failed to save note")?;
            println!("Saved note {}.", note.id);
            Ok(())
        }
        NotesCommand::Delete { id } => {
            api::notes::delete(client, id).await.context("Failed to delete note")?;
            println!("Deleted note {id}.");
            Ok(())
        }
    }
}

/// Blocks until the session is gone or the user interrupts.
async fn watch_session(session: &SessionContext) -> anyhow::Result<()> {
    let who = session.current_user().unwrap_or_else(|| "current user".to_string());
    eprintln!("Watching the session for {who}; Ctrl-C to stop.");

    let mut state = session.subscribe();
    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("failed listening for Ctrl-C")?;
            info!("watch interrupted");
        }
        changed = state.wait_for(|state| *state != NotifierState::Armed) => {
            changed.context("session notifier went away")?;
        }
    }
    Ok(())
}

fn spawn_notices(mut state: watch::Receiver<NotifierState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            match current {
                NotifierState::Firing { remaining_secs, .. } => {
                    eprintln!("Your session has expired. Redirecting to login in {remaining_secs}...");
                }
                NotifierState::Done => break,
                NotifierState::Armed => {}
            }
        }
    })
}

/// The feature's own message when it set one, the raw error otherwise.
fn surfaced<E: Keyed + Clone>(view: &ViewState<E>, err: ApiError) -> anyhow::Error {
    match view.error() {
        Some(message) => anyhow::Error::new(err).context(message),
        None => err.into(),
    }
}

fn expect_applied(outcome: Outcome, id: i64) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied | Outcome::Unchanged => Ok(()),
        Outcome::Busy => bail!("another change to {id} is still in flight"),
        Outcome::NotLoaded => bail!("nothing with id {id} in the current list"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn credentials_error(err: anyhow::Error, what: &str) -> anyhow::Error {
    if api::auth::is_unauthorized(&err) {
        anyhow!("{what}: invalid credentials")
    } else {
        err.context(what.to_string())
    }
}

fn greeting_name(session: &SessionContext, fallback: &str) -> String {
    session.current_user().unwrap_or_else(|| fallback.to_string())
}

fn read_password(given: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("failed reading password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password cannot be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;

    use tideline_shared::TaskPriority;

    use super::*;
    use crate::http::{Method, RawResponse, ScriptedTransport};
    use crate::store::MemoryTokenStore;
    use crate::token::{Claims, encode_unsigned};

    #[derive(Default)]
    struct Recorder {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for Recorder {
        fn redirect(&self, target: &str) {
            self.visits.lock().push(target.to_string());
        }
    }

    fn fixture(token: Option<String>) -> (App<ScriptedTransport>, ScriptedTransport, Arc<Recorder>) {
        let store = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        let session = SessionContext::new(store, 2);
        let transport = ScriptedTransport::new();
        let navigator = Arc::new(Recorder::default());
        let app = App {
            client: ApiClient::new("http://api.test", session, transport.clone()),
            renderer: Renderer::plain(),
            watchdog: WatchdogSettings::default(),
            navigator: navigator.clone(),
        };
        (app, transport, navigator)
    }

    fn live_token() -> String {
        encode_unsigned(&Claims {
            username: Some("marin".to_string()),
            exp: Some(Utc::now().timestamp() + 3600),
            ..Claims::default()
        })
        .expect("encode")
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_command_waits_for_the_redirect() {
        let (app, transport, navigator) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/tasks?archived=false",
            RawResponse::json(401, &json!({"message": "Unauthorized"})),
        );

        let list = TasksCommand::List {
            tab: TaskTab::Active,
            priority: None,
            search: None,
        };
        let err = dispatch(&app, Command::Tasks(list))
            .await
            .expect_err("should expire");

        assert!(api::auth::is_unauthorized(&err));
        assert_eq!(*navigator.visits.lock(), vec!["/login".to_string()]);
        assert_eq!(app.client.session().notifier().state(), NotifierState::Done);
        assert!(!app.client.session().is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn feature_message_wraps_backend_errors() {
        let (app, transport, navigator) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/habits",
            RawResponse::json(500, &json!({"message": "boom"})),
        );

        let err = dispatch(&app, Command::Habits(HabitsCommand::List))
            .await
            .expect_err("should fail");

        assert_eq!(err.to_string(), "Failed to load habits");
        assert!(navigator.visits.lock().is_empty());
        assert_eq!(app.client.session().notifier().state(), NotifierState::Armed);
        assert!(app.client.session().is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn network_commands_need_a_token() {
        let (app, transport, _) = fixture(None);
        let err = dispatch(&app, Command::Tags(TagsCommand::List))
            .await
            .expect_err("should refuse");
        assert!(err.to_string().contains("not logged in"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn login_stores_the_returned_token() {
        let (app, transport, _) = fixture(None);
        let token = live_token();
        transport.on(
            Method::Post,
            "/auth/login",
            RawResponse::json(201, &json!({ "access_token": token })),
        );

        dispatch(
            &app,
            Command::Login {
                identifier: "marin".to_string(),
                password: Some("hunter2".to_string()),
            },
        )
        .await
        .expect("login");

        assert_eq!(app.client.session().token(), Some(token));
        let sent = transport.requests();
        assert_eq!(
            sent[0].body.as_deref(),
            Some(r#"{"identifier":"marin","password":"hunter2"}"#)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_login_reads_as_bad_credentials() {
        let (app, transport, _) = fixture(None);
        transport.on(Method::Post, "/auth/login", RawResponse::json(401, &json!({})));

        let err = dispatch(
            &app,
            Command::Login {
                identifier: "marin".to_string(),
                password: Some("wrong".to_string()),
            },
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.to_string(), "login failed: invalid credentials");
    }

    #[tokio::test(start_paused = true)]
    async fn note_edit_keeps_untouched_fields() {
        let (app, transport, _) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/notes/5",
            RawResponse::json(200, &json!({ "id": 5, "title": "Groceries", "content": "milk" })),
        );
        transport.on(
            Method::Put,
            "/notes/5",
            RawResponse::json(200, &json!({ "id": 5, "title": "Groceries", "content": "milk, eggs" })),
        );

        dispatch(
            &app,
            Command::Notes(NotesCommand::Edit {
                id: 5,
                title: Some("  ".to_string()),
                content: Some("milk, eggs".to_string()),
            }),
        )
        .await
        .expect("edit");

        let put = transport
            .requests()
            .into_iter()
            .find(|request| request.method == Method::Put)
            .expect("put sent");
        let body: serde_json::Value =
            serde_json::from_str(put.body.as_deref().expect("body")).expect("json body");
        assert_eq!(body, json!({ "title": "Groceries", "content": "milk, eggs" }));
    }

    fn task_json(id: i64, title: &str, description: Option<&str>, priority: u8) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "description": description,
            "isComplete": false,
            "isArchived": false,
            "priority": priority,
            "tags": []
        })
    }

    #[tokio::test(start_paused = true)]
    async fn task_list_sends_priority_and_search() {
        let (app, transport, _) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/tasks?archived=false&priority=3&search=tax%20forms",
            RawResponse::json(200, &json!([task_json(2, "tax forms", None, 3)])),
        );

        let list = TasksCommand::List {
            tab: TaskTab::Active,
            priority: Some(TaskPriority::High),
            search: Some("tax forms".to_string()),
        };
        dispatch(&app, Command::Tasks(list)).await.expect("list");

        assert_eq!(
            transport.count(Method::Get, "/tasks?archived=false&priority=3&search=tax%20forms"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn task_show_reads_one_task() {
        let (app, transport, _) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/tasks/8",
            RawResponse::json(200, &task_json(8, "Call plumber", Some("before noon"), 2)),
        );
        transport.on(
            Method::Get,
            "/tasks/9",
            RawResponse::json(404, &json!({ "message": "Task not found" })),
        );

        dispatch(&app, Command::Tasks(TasksCommand::Show { id: 8 }))
            .await
            .expect("show");
        let err = dispatch(&app, Command::Tasks(TasksCommand::Show { id: 9 }))
            .await
            .expect_err("missing");
        assert_eq!(err.to_string(), "Failed to load task");
    }

    #[tokio::test(start_paused = true)]
    async fn task_edit_patches_only_what_changed() {
        let (app, transport, _) = fixture(Some(live_token()));
        transport.on(
            Method::Get,
            "/tasks?archived=false",
            RawResponse::json(200, &json!([task_json(4, "Pay rent", None, 2)])),
        );
        transport.on(
            Method::Patch,
            "/tasks/4",
            RawResponse::json(200, &task_json(4, "Pay rent", Some("by friday"), 3)),
        );
        transport.on(
            Method::Get,
            "/tasks/4",
            RawResponse::json(200, &task_json(4, "Pay rent", Some("by friday"), 3)),
        );

        dispatch(
            &app,
            Command::Tasks(TasksCommand::Edit {
                id: 4,
                title: Some("Pay rent".to_string()),
                description: Some("by friday".to_string()),
                priority: Some(TaskPriority::High),
                due: None,
            }),
        )
        .await
        .expect("edit");

        let patch = transport
            .requests()
            .into_iter()
            .find(|request| request.method == Method::Patch)
            .expect("patch sent");
        let body: serde_json::Value =
            serde_json::from_str(patch.body.as_deref().expect("body")).expect("json body");
        assert_eq!(body, json!({ "description": "by friday", "priority": 3 }));
        assert_eq!(transport.count(Method::Get, "/tasks/4"), 1);
    }
}
