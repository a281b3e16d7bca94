//! Broker pages: list, create, edit, update and delete

use active_model::{Database, Message, Model, SortOrder, Terms};
use axum::{
    Extension, Form,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    errors::AppResult,
    helpers,
    models::{Corretor, SiteModel},
    session::Session,
    state::AppState,
    views::{self, Page},
};

/// Submitted broker fields; `id` is taken from the path, never the body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrokerForm {
    #[serde(skip)]
    pub id: Option<i64>,
    pub cpf: Option<String>,
    pub creci: Option<String>,
    pub name: Option<String>,
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

impl BrokerForm {
    fn from_corretor(corretor: Corretor) -> Self {
        Self {
            id: corretor.id,
            cpf: Some(corretor.cpf),
            creci: Some(corretor.creci),
            name: Some(corretor.name),
        }
    }

    fn to_corretor(&self) -> Corretor {
        Corretor {
            id: self.id,
            cpf: helpers::clean_number(&trimmed(&self.cpf)),
            creci: trimmed(&self.creci),
            name: trimmed(&self.name),
            ..Corretor::default()
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
) -> AppResult<Html<String>> {
    let mut model = SiteModel::new(&state.db)?;
    let registers = model
        .order("id", SortOrder::Asc)
        .fetch_all()
        .await?
        .iter()
        .map(Model::to_entity::<Corretor>)
        .collect::<Result<Vec<_>, _>>()?;

    let page = page(&state, &session, &headers).await;
    Ok(Html(views::index_page(
        &page,
        &registers,
        &BrokerForm::default(),
        false,
    )))
}

pub async fn save_register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    form: Result<Form<BrokerForm>, FormRejection>,
) -> Response {
    let form = submitted(form);
    persist(&state, &session, &headers, form).await
}

pub async fn select_register_to_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return redirect_not_found(&state);
    };

    let form = match SiteModel::new(&state.db) {
        Ok(mut model) => model
            .search_by_id(id)
            .await
            .and_then(|found| found.to_entity::<Corretor>().ok())
            .map(BrokerForm::from_corretor),
        Err(err) => {
            tracing::warn!(error = %err, "could not open broker model");
            None
        }
    };

    if form.is_none() {
        session
            .flash(Message::alert("O corretor selecionado não existe!"))
            .await;
    }

    render_index(&state, &session, &headers, &form.unwrap_or_default()).await
}

pub async fn update_register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Path(id): Path<String>,
    form: Result<Form<BrokerForm>, FormRejection>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return redirect_not_found(&state);
    };

    let mut form = submitted(form);
    form.id = Some(id);
    persist(&state, &session, &headers, form).await
}

pub async fn delete_register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return redirect_not_found(&state);
    };

    let message = match SiteModel::new(&state.db) {
        Ok(mut model) => match model.search_by_id(id).await {
            None => Message::alert("O corretor que você está tentando deletar não existe!"),
            Some(mut register) => {
                let name = register.get_str("name").unwrap_or_default().to_string();
                if register.destroy().await {
                    tracing::info!(id, "broker deleted");
                    Message::success(format!(
                        "Registro do corretor {name} deletado com sucesso!"
                    ))
                } else {
                    Message::error("Erro ao deletar o registro.")
                }
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "could not open broker model");
            Message::error("Erro ao deletar o registro.")
        }
    };

    session.flash(message).await;
    redirect(&state.site.base_path)
}

pub async fn error404(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
) -> Response {
    let page = page(&state, &session, &headers).await;
    (StatusCode::NOT_FOUND, Html(views::not_found_page(&page))).into_response()
}

/// Target of unknown paths and wrong methods
pub async fn not_found(State(state): State<AppState>) -> Response {
    redirect_not_found(&state)
}

/// Validate, then insert or update depending on `form.id`
async fn persist(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    form: BrokerForm,
) -> Response {
    if let Err(alert) = data_validation(&state.db, &form).await {
        session.flash(alert).await;
        return render_index(state, session, headers, &form).await;
    }

    let corretor = form.to_corretor();
    let mut register = match SiteModel::from_corretor(&state.db, &corretor) {
        Ok(register) => register,
        Err(err) => {
            tracing::warn!(error = %err, "could not build broker model");
            session.flash(Message::error(" | Erro interno")).await;
            return render_index(state, session, headers, &form).await;
        }
    };

    if register.save().await {
        let verb = if form.id.is_some() {
            "atualizado"
        } else {
            "cadastrado"
        };
        tracing::info!(id = ?register.id(), verb, "broker saved");
        session
            .flash(Message::success(format!(
                "Corretor '{}' {verb} com sucesso!",
                corretor.name
            )))
            .await;
        return redirect(&state.site.base_path);
    }

    let code = register
        .error()
        .and_then(|err| err.code())
        .unwrap_or_else(|| "interno".to_string());
    let text = register.message().map(Message::text).unwrap_or_default();
    session
        .flash(Message::error(format!("{text} | Erro {code}")))
        .await;
    render_index(state, session, headers, &form).await
}

/// Field rules for a broker form.
///
/// Format checks run before the uniqueness lookups; the first failure is
/// returned as the alert to show.
pub async fn data_validation(db: &Database, form: &BrokerForm) -> Result<(), Message> {
    let cpf_input = trimmed(&form.cpf);
    let creci = trimmed(&form.creci);
    let name = trimmed(&form.name);
    let cpf = helpers::clean_number(&cpf_input);

    if cpf_input.is_empty() {
        return Err(Message::alert("O CPF precisa ser informado!"));
    }
    if cpf.len() != 11 {
        return Err(Message::alert(
            "O CPF deve ter exatamente 11 caracteres.",
        ));
    }
    if !helpers::validate_cpf(&cpf) {
        return Err(Message::alert("O CPF informado é inválido."));
    }

    if creci.is_empty() {
        return Err(Message::alert("O CRECI precisa ser informado!"));
    }
    let creci_len = creci.chars().count();
    if !(2..=15).contains(&creci_len) {
        return Err(Message::alert(
            "O CRECI deve ter entre 2 e 15 caracteres.",
        ));
    }

    if name.is_empty() {
        return Err(Message::alert("O NOME precisa ser informado!"));
    }
    let name_len = name.chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(Message::alert(
            "O nome deve ter entre 2 e 100 caracteres.",
        ));
    }

    if is_taken(db, "cpf", &cpf, form.id).await? {
        return Err(Message::alert(
            "O CPF informado pertence a outro registro, verifique o número e tente novamente.",
        ));
    }
    if is_taken(db, "creci", &creci, form.id).await? {
        return Err(Message::alert(
            "O CRECI informado pertence a outro registro, verifique o número e tente novamente.",
        ));
    }

    Ok(())
}

/// Whether another row already uses `value` in `column`
async fn is_taken(
    db: &Database,
    column: &str,
    value: &str,
    editing: Option<i64>,
) -> Result<bool, Message> {
    let terms = match editing {
        Some(id) => Terms::new(format!("{column} = :value AND id != :id"))
            .bind("value", value)
            .bind("id", id),
        None => Terms::new(format!("{column} = :value")).bind("value", value),
    };

    let lookup = match SiteModel::new(db) {
        Ok(mut model) => model.search(terms).limit(1).fetch_one().await,
        Err(err) => Err(err),
    };

    lookup.map(|found| found.is_some()).map_err(|err| {
        tracing::warn!(column, error = %err, "uniqueness check failed");
        Message::error("Não foi possível validar os dados, tente novamente.")
    })
}

async fn render_index(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    form: &BrokerForm,
) -> Response {
    let (registers, load_failed) = match SiteModel::new(&state.db) {
        Ok(mut model) => {
            let registers = model
                .order("id", SortOrder::Asc)
                .result_all()
                .await
                .unwrap_or_default();
            let failed = model.error().is_some();
            let registers = registers
                .iter()
                .filter_map(|register| register.to_entity::<Corretor>().ok())
                .collect::<Vec<_>>();
            (registers, failed)
        }
        Err(_) => (Vec::new(), true),
    };

    let page = page(state, session, headers).await;
    Html(views::index_page(&page, &registers, form, load_failed)).into_response()
}

async fn page<'a>(state: &'a AppState, session: &Session, headers: &'a HeaderMap) -> Page<'a> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");

    Page {
        site: &state.site,
        host,
        flash: session.take_flash().await,
    }
}

fn submitted(form: Result<Form<BrokerForm>, FormRejection>) -> BrokerForm {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "no usable form body");
            BrokerForm::default()
        }
    }
}

/// Route ids are plain digit strings
fn parse_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn redirect_not_found(state: &AppState) -> Response {
    redirect(&format!("{}404", state.site.base_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_digits() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("007"), Some(7));
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn form_is_trimmed_and_cpf_cleaned() {
        let form = BrokerForm {
            id: Some(2),
            cpf: Some(" 529.982.247-25 ".to_string()),
            creci: Some(" 12345 ".to_string()),
            name: Some("Ana".to_string()),
        };
        let corretor = form.to_corretor();
        assert_eq!(corretor.id, Some(2));
        assert_eq!(corretor.cpf, "52998224725");
        assert_eq!(corretor.creci, "12345");
    }
}
