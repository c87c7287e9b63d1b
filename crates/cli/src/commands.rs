//! Command dispatch
//!
//! Every subcommand runs inside [`handle_api_error`], so a failure is
//! rendered once on the console and surfaces here only as `Err(Reported)`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use agentcore_domain::{
    ConfigurationError, NewCredential, NewDataSource, NewDataVersion, NewDeployment, Result,
    RunExperiment,
};
use agentcore_infra::{ApiClientConfig, ConfigStore, HttpTransport};

use crate::cli::{
    Cli, Commands, CredentialCommands, DataSourceCommands, DataVersionCommands, DeployCommands,
    ExperimentCommands, LoginArgs, ProjectCommands,
};
use crate::console::Console;
use crate::error_handler::{handle_api_error, ErrorOptions, Handled};
use crate::managers::{
    AuthManager, BaseManager, CredentialManager, DataVersionManager, DeployManager,
    ExperimentManager, ProjectManager, ResourceManager,
};
use crate::output::OutputFormat;

/// Everything a subcommand needs, resolved once from the global flags
pub struct CommandContext {
    store: ConfigStore,
    console: Console,
    transport: Arc<dyn HttpTransport>,
    api_config: ApiClientConfig,
    output: OutputFormat,
    options: ErrorOptions,
}

impl CommandContext {
    pub fn new(
        cli: &Cli,
        store: ConfigStore,
        console: Console,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let api_config = ApiClientConfig {
            timeout: Duration::from_secs(cli.timeout),
            verify_tls: !cli.insecure,
            ..ApiClientConfig::default()
        };
        let options = ErrorOptions { show_details: cli.details, ..ErrorOptions::default() };
        Self {
            store,
            console,
            transport,
            api_config,
            output: OutputFormat::new(cli.format),
            options,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Run one subcommand
    pub async fn dispatch(&self, command: Commands) -> Handled<()> {
        match command {
            Commands::Configure { url } => {
                self.handle(async {
                    let binding = AuthManager::configure(&self.store, &url)?;
                    self.console.success(format!("Server set to {}", binding.base_url()));
                    Ok(())
                })
                .await
            }
            Commands::Login(args) => self.login(args).await,
            Commands::Logout => {
                self.handle(async {
                    if AuthManager::logout(&self.store)? {
                        self.console.success("Logged out");
                    } else {
                        self.console.line("Not logged in.");
                    }
                    Ok(())
                })
                .await
            }
            Commands::Whoami => {
                self.with_base(|base| async move {
                    let profile = AuthManager::new(base).whoami().await?;
                    self.print(self.output.record(AuthManager::COLUMNS, &profile)?);
                    Ok(())
                })
                .await
            }
            Commands::Status => {
                self.handle(async {
                    let status = AuthManager::status(&self.store)?;
                    self.print(self.output.record(AuthManager::STATUS_COLUMNS, &status)?);
                    Ok(())
                })
                .await
            }
            Commands::Project { command } => self.project(command).await,
            Commands::DataSource { command } => self.data_source(command).await,
            Commands::DataVersion { command } => self.data_version(command).await,
            Commands::Experiment { command } => self.experiment(command).await,
            Commands::Deploy { command } => self.deploy(command).await,
            Commands::Credential { command } => self.credential(command).await,
        }
    }

    async fn login(&self, args: LoginArgs) -> Handled<()> {
        let LoginArgs { email, password } = args;
        let email = self
            .handle(async {
                match email {
                    Some(email) => Ok(email),
                    None => Ok(self
                        .store
                        .remembered_login_email()?
                        .ok_or(ConfigurationError::MissingLoginEmail)?),
                }
            })
            .await?;

        self.with_base(|base| async move {
            let session = AuthManager::new(base).login(&email, &password).await?;
            self.console.success(format!("Logged in as {email} (user {})", session.user_id));
            Ok(())
        })
        .await
    }

    async fn project(&self, command: ProjectCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = ProjectManager::new(base);
            match command {
                ProjectCommands::List => {
                    let projects = manager.list().await?;
                    self.print(self.output.list(ProjectManager::COLUMNS, &projects)?);
                }
                ProjectCommands::Get { id } => {
                    let project = manager.get(&id).await?;
                    self.print(self.output.record(ProjectManager::COLUMNS, &project)?);
                }
                ProjectCommands::Create { name, description } => {
                    let project = manager.create(&name, &description).await?;
                    self.print(self.output.record(ProjectManager::COLUMNS, &project)?);
                }
                ProjectCommands::Delete { id } => {
                    manager.delete(&id).await?;
                    self.console.success(format!("Deleted project {id}"));
                }
            }
            Ok(())
        })
        .await
    }

    async fn data_source(&self, command: DataSourceCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = DataVersionManager::new(base);
            match command {
                DataSourceCommands::List { project } => {
                    let sources = manager.list_sources(project.as_deref()).await?;
                    self.print(self.output.list(DataVersionManager::SOURCE_COLUMNS, &sources)?);
                }
                DataSourceCommands::Create { name, source_type, uri, project } => {
                    let source = manager
                        .create_source(NewDataSource { name, source_type, uri, project })
                        .await?;
                    self.print(self.output.record(DataVersionManager::SOURCE_COLUMNS, &source)?);
                }
            }
            Ok(())
        })
        .await
    }

    async fn data_version(&self, command: DataVersionCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = DataVersionManager::new(base);
            match command {
                DataVersionCommands::List { source } => {
                    let versions = manager.list_versions(source.as_deref()).await?;
                    self.print(self.output.list(DataVersionManager::COLUMNS, &versions)?);
                }
                DataVersionCommands::Get { id } => {
                    let version = manager.get_version(&id).await?;
                    self.print(self.output.record(DataVersionManager::COLUMNS, &version)?);
                }
                DataVersionCommands::Create { source, tag, description } => {
                    let version = manager
                        .create_version(NewDataVersion { data_source: source, tag, description })
                        .await?;
                    self.print(self.output.record(DataVersionManager::COLUMNS, &version)?);
                }
                DataVersionCommands::Preview { id, columns, limit } => {
                    let preview = manager.preview(&id, &columns, limit).await?;
                    self.print(self.output.preview(&preview)?);
                }
                DataVersionCommands::History { id } => {
                    let entries = manager.history(&id).await?;
                    self.print(self.output.list(DataVersionManager::HISTORY_COLUMNS, &entries)?);
                }
            }
            Ok(())
        })
        .await
    }

    async fn experiment(&self, command: ExperimentCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = ExperimentManager::new(base);
            match command {
                ExperimentCommands::List { project } => {
                    let experiments = manager.list(project.as_deref()).await?;
                    self.print(self.output.list(ExperimentManager::COLUMNS, &experiments)?);
                }
                ExperimentCommands::Get { id } => {
                    let experiment = manager.get(&id).await?;
                    self.print(self.output.record(ExperimentManager::COLUMNS, &experiment)?);
                }
                ExperimentCommands::Run { project, data_version, name, params } => {
                    let run = RunExperiment {
                        project,
                        data_version,
                        name,
                        parameters: parameter_map(params),
                    };
                    let experiment = manager.run(run).await?;
                    self.print(self.output.record(ExperimentManager::COLUMNS, &experiment)?);
                }
                ExperimentCommands::Promote { id, stage } => {
                    let experiment = manager.promote(&id, stage).await?;
                    self.console.success(format!("Promoted experiment {id} to {stage}"));
                    self.print(self.output.record(ExperimentManager::COLUMNS, &experiment)?);
                }
            }
            Ok(())
        })
        .await
    }

    async fn deploy(&self, command: DeployCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = DeployManager::new(base);
            match command {
                DeployCommands::List => {
                    let deployments = manager.list().await?;
                    self.print(self.output.list(DeployManager::COLUMNS, &deployments)?);
                }
                DeployCommands::Create { name, experiment, target, replicas } => {
                    let deployment = manager
                        .create(NewDeployment { name, experiment, target, replicas })
                        .await?;
                    self.print(self.output.record(DeployManager::COLUMNS, &deployment)?);
                }
                DeployCommands::Delete { id } => {
                    manager.delete(&id).await?;
                    self.console.success(format!("Deleted deployment {id}"));
                }
            }
            Ok(())
        })
        .await
    }

    async fn credential(&self, command: CredentialCommands) -> Handled<()> {
        self.with_base(|base| async move {
            let manager = CredentialManager::new(base);
            match command {
                CredentialCommands::List => {
                    let credentials = manager.list().await?;
                    self.print(self.output.list(CredentialManager::COLUMNS, &credentials)?);
                }
                CredentialCommands::Create { name, provider, secrets } => {
                    let secrets =
                        secrets.into_iter().map(|(key, value)| (key, Value::String(value))).collect();
                    let credential =
                        manager.create(NewCredential { name, provider, secrets }).await?;
                    self.print(self.output.record(CredentialManager::COLUMNS, &credential)?);
                }
                CredentialCommands::Delete { id } => {
                    manager.delete(&id).await?;
                    self.console.success(format!("Deleted credential {id}"));
                }
            }
            Ok(())
        })
        .await
    }

    /// Build a manager for the configured server, then run `operation` with
    /// it. Both steps report their own failures.
    async fn with_base<T, F, Fut>(&self, operation: F) -> Handled<T>
    where
        F: FnOnce(BaseManager) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let base = self.handle(async { self.base() }).await?;
        let handler = base.clone();
        handler.handle(self.options, operation(base)).await
    }

    fn base(&self) -> Result<BaseManager> {
        Ok(BaseManager::new(
            self.store.clone(),
            self.console.clone(),
            Arc::clone(&self.transport),
            self.api_config.clone(),
        )?)
    }

    async fn handle<T, F>(&self, operation: F) -> Handled<T>
    where
        F: Future<Output = Result<T>>,
    {
        handle_api_error(&self.console, self.options, operation).await
    }

    fn print(&self, rendered: String) {
        self.console.line(rendered);
    }
}

/// Open the config store and run the parsed command line
pub async fn run(cli: Cli, console: Console, transport: Arc<dyn HttpTransport>) -> Handled<()> {
    let options = ErrorOptions { show_details: cli.details, ..ErrorOptions::default() };
    let config_dir = cli.config_dir.clone();
    let store =
        handle_api_error(&console, options, async { Ok(ConfigStore::open(config_dir)?) }).await?;

    let context = CommandContext::new(&cli, store, console, transport);
    context.dispatch(cli.command).await
}

/// `key=value` pairs to a JSON object; values that parse as JSON keep their type
fn parameter_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use agentcore_domain::{AgentCoreError, Session};
    use agentcore_infra::testing::{seeded_store, temp_store, ScriptedTransport};
    use agentcore_infra::RawResponse;
    use clap::Parser;
    use serde_json::json;

    use super::*;
    use crate::console::OutputBuffer;

    fn context(
        store: ConfigStore,
        transport: &ScriptedTransport,
        args: &[&str],
    ) -> (CommandContext, Cli, OutputBuffer) {
        let mut argv = vec!["agentcore"];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let (console, buffer) = Console::buffered();
        let context = CommandContext::new(&cli, store, console, Arc::new(transport.clone()));
        (context, cli, buffer)
    }

    #[test]
    fn test_parameter_map_keeps_json_types() {
        let params = parameter_map(vec![
            ("lr".into(), "0.01".into()),
            ("epochs".into(), "10".into()),
            ("optimizer".into(), "adam".into()),
            ("layers".into(), "[64,32]".into()),
        ]);
        assert_eq!(
            Value::Object(params),
            json!({"lr": 0.01, "epochs": 10, "optimizer": "adam", "layers": [64, 32]})
        );
    }

    #[tokio::test]
    async fn test_configure_then_status() {
        let (_dir, store) = temp_store();
        let transport = ScriptedTransport::new();

        let (ctx, cli, buffer) = context(store.clone(), &transport, &["configure", "--url", "https://x/"]);
        ctx.dispatch(cli.command).await.unwrap();
        assert!(buffer.contents().contains("Server set to https://x"));

        let (ctx, cli, buffer) = context(store, &transport, &["status", "--format", "json"]);
        ctx.dispatch(cli.command).await.unwrap();
        let status: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
        assert_eq!(status["base_url"], "https://x");
        assert_eq!(status["logged_in"], false);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_server_is_reported() {
        let (_dir, store) = temp_store();
        let transport = ScriptedTransport::new();
        let (ctx, cli, buffer) = context(store, &transport, &["project", "list"]);

        let reported = ctx.dispatch(cli.command).await.unwrap_err();

        assert!(matches!(
            reported.error(),
            AgentCoreError::Config(ConfigurationError::MissingBaseUrl)
        ));
        assert!(buffer.contents().contains("Configuration error"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_without_email_or_memory() {
        let (_dir, store) = seeded_store("https://x", None);
        let transport = ScriptedTransport::new();
        let (ctx, cli, _buffer) = context(store, &transport, &["login", "--password", "pw"]);

        let reported = ctx.dispatch(cli.command).await.unwrap_err();

        assert!(matches!(
            reported.error(),
            AgentCoreError::Config(ConfigurationError::MissingLoginEmail)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_reuses_remembered_email() {
        let (_dir, store) = seeded_store("https://x", None);
        store.remember_login_email("u@x").unwrap();
        let transport = ScriptedTransport::new();
        transport.push_response(RawResponse::json(
            200,
            &json!({"access": "A1", "refresh": "R1", "user_id": 7}),
        ));
        let (ctx, cli, buffer) = context(store.clone(), &transport, &["login", "--password", "pw"]);

        ctx.dispatch(cli.command).await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].json_body, Some(json!({"email": "u@x", "password": "pw"})));
        assert!(buffer.contents().contains("Logged in as u@x (user 7)"));
        let session = store.session().unwrap().unwrap();
        assert_eq!(session.access_token, "A1");
    }

    #[tokio::test]
    async fn test_project_list_renders_table() {
        let (_dir, store) =
            seeded_store("https://x", Some(Session::new("A1", "R1", "7", "u@x")));
        let transport = ScriptedTransport::new();
        transport.push_response(RawResponse::json(
            200,
            &json!({"results": [{"id": 1, "name": "churn", "description": "weekly"}]}),
        ));
        let (ctx, cli, buffer) = context(store, &transport, &["project", "list"]);

        ctx.dispatch(cli.command).await.unwrap();

        let output = buffer.contents();
        assert!(output.contains("ID"), "{output}");
        assert!(output.contains("churn"), "{output}");
        assert!(output.contains("weekly"), "{output}");
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let (_dir, store) = seeded_store("https://x", None);
        let transport = ScriptedTransport::new();
        let (ctx, cli, buffer) = context(store, &transport, &["logout"]);

        ctx.dispatch(cli.command).await.unwrap();

        assert_eq!(buffer.contents(), "Not logged in.\n");
    }
}
