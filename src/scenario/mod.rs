//! # Partner order scenario
//!
//! Authenticate, find the customer's latest order, fetch its detail and
//! check it against the order contract. Each step depends on the previous
//! one and the first failure ends the run.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::auth::{AuthMethod, TokenResponse, password_grant_form};
use crate::clock::brasilia_timestamp;
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::http::{HttpClient, HttpResponse, RequestBody, RequestInput};
use crate::orders::{latest_order_for, parse_order_list};
use crate::report::ResultsDir;
use crate::schema::SchemaStore;
use crate::testing::{Parameter, Recorder, RunState, Status, TestResult, assert_success, now_millis};

pub const SUITE_NAME: &str = "Fluxo 5.2.3 - Listagem de pedidos por Order - Marketplace";
pub const TEST_NAME: &str = "AGROFEL - Fluxo 5.2.3 - Listagem de pedidos por Order - Marketplace";

const LIST_PAGE_SIZE: &str = "50";

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub result: TestResult,
    pub state: RunState,
    pub environment: Vec<Parameter>,
    /// Requests actually sent to the API.
    pub http_calls: usize,
    pub exit_code: i32,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.result.status == Status::Passed
    }
}

/// Mutable bookkeeping threaded through the steps.
struct Run {
    state: RunState,
    recorder: Recorder,
    http_calls: usize,
}

pub struct Scenario<'a> {
    config: &'a ProbeConfig,
    client: &'a HttpClient,
    schemas: SchemaStore,
}

impl<'a> Scenario<'a> {
    pub fn new(config: &'a ProbeConfig, client: &'a HttpClient) -> Self {
        Self {
            config,
            client,
            schemas: SchemaStore::new(&config.schema.dir),
        }
    }

    /// Run every step and return the recorded outcome. Never fails: errors
    /// become a failed or broken result.
    #[instrument(skip(self), fields(base_url = %self.config.base_url()))]
    pub async fn run(&self) -> ScenarioOutcome {
        let mut recorder = Recorder::new(TEST_NAME, format!("{SUITE_NAME} {TEST_NAME}"));
        recorder
            .severity("critical")
            .feature("Marketplace")
            .story("Fluxo de Pedido")
            .link(
                "Documentação da API",
                format!("{}/swagger-ui.html", self.config.base_url()),
            )
            .description(
                "Autentica via OAuth, busca o último pedido do cliente e valida os atributos.",
            );

        let mut run = Run {
            state: RunState::default(),
            recorder,
            http_calls: 0,
        };

        let outcome = self.steps(&mut run).await;

        let (status, message, exit_code) = match outcome {
            Ok(()) => (Status::Passed, None, 0),
            Err(ProbeError::Scenario(message)) => (Status::Failed, Some(message), 1),
            Err(other) => {
                let message = other.to_string();
                run.state.fail("Execução", message.clone());
                (Status::Broken, Some(message), other.exit_code())
            }
        };

        run.recorder.close_steps(status);
        let snapshot = serde_json::to_value(&run.state).unwrap_or(Value::Null);
        run.recorder.attach_json("Estado Final do Teste", &snapshot);

        match &message {
            None => info!(http_calls = run.http_calls, "scenario passed"),
            Some(m) => warn!(status = status.label(), http_calls = run.http_calls, "scenario did not pass: {m}"),
        }

        ScenarioOutcome {
            result: run.recorder.finish(status, message),
            state: run.state,
            environment: self.environment_info(),
            http_calls: run.http_calls,
            exit_code,
        }
    }

    /// Environment table shown in the report.
    pub fn environment_info(&self) -> Vec<Parameter> {
        vec![
            Parameter {
                name: "Data/Hora (Brasília)".into(),
                value: brasilia_timestamp(Utc::now()),
            },
            Parameter {
                name: "Ambiente".into(),
                value: self.config.base_url().to_string(),
            },
            Parameter {
                name: "ID da Execução".into(),
                value: self
                    .config
                    .api
                    .run_id
                    .clone()
                    .unwrap_or_else(|| "Local".into()),
            },
        ]
    }

    async fn steps(&self, run: &mut Run) -> Result<()> {
        let token = self.authenticate(run).await?;
        let order_id = self.find_order(run, &token).await?;
        self.check_order(run, &token, &order_id).await
    }

    async fn authenticate(&self, run: &mut Run) -> Result<String> {
        if let Some(token) = &self.config.overrides.access_token {
            run.recorder.start_step("1. Autenticação — token fixo (override)");
            run.state.ok("[OK] Step 1: token fixo utilizado (override).");
            run.recorder.end_step(Status::Passed);
            return Ok(token.clone());
        }

        run.recorder.start_step("Step 1 — POST /oauth/token");

        let username = self.config.auth.username.as_deref().unwrap_or_default();
        let password = self.config.auth.password.as_deref().unwrap_or_default();
        let request = RequestInput::post(format!("{}/oauth/token", self.config.base_url()))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .auth(AuthMethod::basic_encoded(self.config.auth.basic.as_deref()))
            .body(RequestBody::Form(password_grant_form(username, password)));

        let response = self.send(run, request).await?;
        let body = response.json();
        run.recorder.attach_json("Response Body — Auth", &body);
        run.recorder
            .parameter("Tempo de Resposta (Step 1)", format!("{}ms", response.duration_ms));
        assert_success(
            &response,
            &format!("Step 1 — POST /oauth/token ({}ms)", response.duration_ms),
            &mut run.state,
            &mut run.recorder,
        )?;

        let token = serde_json::from_value::<TokenResponse>(body)
            .ok()
            .and_then(|t| t.token().map(str::to_owned));
        let Some(token) = token else {
            return Err(run
                .state
                .fail("Step 1", "access_token ausente na resposta de autenticação."));
        };

        run.recorder.end_step(Status::Passed);
        Ok(token)
    }

    async fn find_order(&self, run: &mut Run, token: &str) -> Result<String> {
        if let Some(order_id) = &self.config.overrides.order_id {
            run.recorder
                .start_step("2. Busca do pedido — orderId fixo (override)");
            run.state
                .ok(format!("[OK] Step 2: orderId fixo utilizado ({order_id})."));
            run.recorder.end_step(Status::Passed);
            return Ok(order_id.clone());
        }

        run.recorder.start_step("Step 2 — GET /partnerOrders/list/store");

        let request = RequestInput::get(format!(
            "{}/partnerOrders/list/store",
            self.config.base_url()
        ))
        .query("offset", "0")
        .query("limit", LIST_PAGE_SIZE)
        .query("_t", now_millis().to_string())
        .auth(AuthMethod::bearer(token));

        let response = self.send(run, request).await?;
        let body = response.json();
        run.recorder.attach_json("Response Body — Listagem", &body);
        run.recorder
            .parameter("Tempo de Resposta (Step 2)", format!("{}ms", response.duration_ms));
        assert_success(
            &response,
            &format!(
                "Step 2 — GET /partnerOrders/list/store ({}ms)",
                response.duration_ms
            ),
            &mut run.state,
            &mut run.recorder,
        )?;

        let Some(orders) = parse_order_list(&body) else {
            return Err(run
                .state
                .fail("Step 2", "resposta de listagem não é uma lista de pedidos."));
        };

        let customer_doc = self.config.api.customer_doc.as_str();
        let Some(latest) = latest_order_for(&orders, customer_doc) else {
            return Err(run.state.fail(
                "Step 2",
                format!("Nenhum pedido encontrado para o cliente {customer_doc}."),
            ));
        };

        let Some(order_id) = latest.order_id.as_ref().filter(|id| !id.is_blank()) else {
            return Err(run
                .state
                .fail("Step 2", "orderId não encontrado no pedido mais recente."));
        };

        let order_id = order_id.to_string();
        run.state
            .ok(format!("[OK] Step 2: orderId obtido — {order_id}."));
        run.recorder.end_step(Status::Passed);
        Ok(order_id)
    }

    async fn check_order(&self, run: &mut Run, token: &str, order_id: &str) -> Result<()> {
        run.recorder
            .start_step("Step 3 — GET /partnerOrders/store/order/:id");
        run.recorder.parameter("Order ID", order_id);

        let request = RequestInput::get(format!(
            "{}/partnerOrders/store/order/{order_id}",
            self.config.base_url()
        ))
        .auth(AuthMethod::bearer(token));

        let response = self.send(run, request).await?;
        let body = response.json();
        run.recorder
            .attach_json("Response Body — Detalhe do Pedido", &body);
        run.recorder
            .parameter("Tempo de Resposta (Step 3)", format!("{}ms", response.duration_ms));
        assert_success(
            &response,
            &format!(
                "Step 3 — GET /partnerOrders/store/order/{order_id} ({}ms)",
                response.duration_ms
            ),
            &mut run.state,
            &mut run.recorder,
        )?;

        run.recorder.start_step("Validação de JSON Schema");
        let schema_name = self.config.schema.name.as_str();
        let report = self.schemas.validate(schema_name, &body)?;
        if !report.is_valid() {
            run.recorder.attach_json(
                format!("Violações — {schema_name}"),
                &serde_json::to_value(&report.violations)?,
            );
            return Err(run.state.fail("Step 3", report.failure_message()));
        }
        run.recorder.end_step(Status::Passed);

        run.state.ok("[OK] Step 3: Contrato validado com sucesso.");
        run.state
            .ok("[OK] Step 3: partnerOrderAttributes validados via Schema.");
        run.state
            .ok("[OK] Step 3: priceContractSkuCustomAttributes validados via Schema.");
        run.state
            .ok("[OK] Step 3: paymentDateVpvf validado via Schema.");

        run.recorder.end_step(Status::Passed);
        Ok(())
    }

    async fn send(&self, run: &mut Run, request: RequestInput) -> Result<HttpResponse> {
        run.http_calls += 1;
        self.client.send(request).await
    }
}

/// Run the scenario and persist its result and environment table into the
/// configured results directory.
pub async fn execute(config: &ProbeConfig, client: &HttpClient) -> Result<ScenarioOutcome> {
    config.validate_scenario()?;
    let outcome = Scenario::new(config, client).run().await;

    let results = ResultsDir::new(&config.report.results_dir);
    results.ensure()?;
    let path = results.write_result(&outcome.result)?;
    results.write_environment(&outcome.environment)?;
    info!(path = %path.display(), status = outcome.result.status.label(), "result written");

    Ok(outcome)
}
