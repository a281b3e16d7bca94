//! Server-rendered HTML
//!
//! Pages are assembled from plain strings. Every value that came from a
//! request or the database passes through [`escape_html`] before it is
//! written into markup.

use active_model::{Message, escape_html};
use axum::http::StatusCode;
use config::SiteConfig;

use crate::controllers::site::BrokerForm;
use crate::helpers;
use crate::models::Corretor;

/// What every page needs besides its body
pub struct Page<'a> {
    pub site: &'a SiteConfig,
    pub host: &'a str,
    pub flash: Option<Message>,
}

impl Page<'_> {
    fn link(&self, path: &str) -> String {
        escape_html(&format!("{}{}", self.site.base_path, path))
    }

    fn render(&self, title: &str, body: &str) -> String {
        let flash = self
            .flash
            .as_ref()
            .map(Message::render)
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html lang="pt-br">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="description" content="{description}">
<link rel="canonical" href="{canonical}">
<title>{title} | {name}</title>
<link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet">
</head>
<body>
<nav class="navbar bg-dark" data-bs-theme="dark"><div class="container"><a class="navbar-brand" href="{home}">{name}</a></div></nav>
<main class="container my-4">
<div id="flash">{flash}</div>
{body}
</main>
<footer class="container border-top py-3 text-muted small">{name} &middot; {date}</footer>
<script src="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js"></script>
</body>
</html>"#,
            description = escape_html(&self.site.description),
            canonical = escape_html(&helpers::url(self.site, self.host, "")),
            title = escape_html(title),
            name = escape_html(&self.site.name),
            home = self.link(""),
            date = escape_html(&helpers::current_date()),
        )
    }
}

/// Broker list with the create or edit form above it
pub fn index_page(
    page: &Page<'_>,
    registers: &[Corretor],
    form: &BrokerForm,
    load_failed: bool,
) -> String {
    let mut body = broker_form(page, form);
    body.push_str(&broker_table(page, registers, load_failed));
    page.render("Corretores", &body)
}

fn broker_form(page: &Page<'_>, form: &BrokerForm) -> String {
    let (action, heading, button) = match form.id {
        Some(id) => (
            page.link(&format!("salvar-edicao/{id}")),
            "Editar corretor",
            "Salvar alterações",
        ),
        None => (page.link("cadastrar"), "Cadastrar corretor", "Cadastrar"),
    };

    let cancel = if form.id.is_some() {
        format!(
            r#" <a class="btn btn-outline-secondary" href="{}">Cancelar</a>"#,
            page.link("")
        )
    } else {
        String::new()
    };

    format!(
        r#"<section class="card mb-4"><div class="card-body">
<h1 class="h4 card-title">{heading}</h1>
<form method="post" action="{action}" class="row g-3">
<div class="col-md-4"><label class="form-label" for="cpf">CPF</label><input class="form-control" id="cpf" name="cpf" maxlength="14" value="{cpf}"></div>
<div class="col-md-3"><label class="form-label" for="creci">CRECI</label><input class="form-control" id="creci" name="creci" maxlength="15" value="{creci}"></div>
<div class="col-md-5"><label class="form-label" for="name">Nome</label><input class="form-control" id="name" name="name" maxlength="100" value="{name}"></div>
<div class="col-12"><button type="submit" class="btn btn-primary">{button}</button>{cancel}</div>
</form>
</div></section>
"#,
        cpf = escape_html(form.cpf.as_deref().unwrap_or_default()),
        creci = escape_html(form.creci.as_deref().unwrap_or_default()),
        name = escape_html(form.name.as_deref().unwrap_or_default()),
    )
}

fn broker_table(page: &Page<'_>, registers: &[Corretor], load_failed: bool) -> String {
    if load_failed {
        return Message::error("Não foi possível carregar os corretores.").render();
    }
    if registers.is_empty() {
        return Message::notify("Nenhum corretor cadastrado.").render();
    }

    let rows: String = registers
        .iter()
        .map(|corretor| {
            let id = corretor.id.unwrap_or_default();
            format!(
                r#"<tr><td>{id}</td><td>{name}</td><td>{cpf}</td><td>{creci}</td><td class="text-end"><a class="btn btn-sm btn-outline-primary" href="{edit}">Editar</a> <a class="btn btn-sm btn-outline-danger" href="{delete}" onclick="return confirm('Deletar este corretor?')">Deletar</a></td></tr>
"#,
                name = escape_html(&corretor.name),
                cpf = escape_html(&helpers::mask_cpf(&corretor.cpf)),
                creci = escape_html(&corretor.creci),
                edit = page.link(&format!("editar/{id}")),
                delete = page.link(&format!("deletar/{id}")),
            )
        })
        .collect();

    format!(
        r#"<table class="table table-striped align-middle">
<thead><tr><th>#</th><th>Nome</th><th>CPF</th><th>CRECI</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>
"#
    )
}

pub fn not_found_page(page: &Page<'_>) -> String {
    let body = format!(
        r#"<div class="text-center py-5"><h1 class="display-4">404</h1><p class="lead">Página não encontrada.</p><a class="btn btn-primary" href="{}">Voltar para o início</a></div>"#,
        page.link("")
    );
    page.render("Página não encontrada", &body)
}

/// Bare page for failures that happen before a site page can be built
pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-br"><head><meta charset="utf-8"><title>{code}</title></head>
<body><h1>{code}</h1><p>{message}</p></body></html>"#,
        code = status.as_u16(),
        message = escape_html(message),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig::default()
    }

    #[test]
    fn index_escapes_broker_fields() {
        let site = site();
        let page = Page {
            site: &site,
            host: "localhost",
            flash: Some(Message::success("ok")),
        };
        let registers = vec![Corretor {
            id: Some(7),
            cpf: "52998224725".to_string(),
            creci: "12345".to_string(),
            name: "<b>Ana</b>".to_string(),
            ..Corretor::default()
        }];

        let html = index_page(&page, &registers, &BrokerForm::default(), false);
        assert!(html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(!html.contains("<b>Ana</b>"));
        assert!(html.contains("529.982.247-25"));
        assert!(html.contains("/imovel-guide/editar/7"));
        assert!(html.contains("/imovel-guide/deletar/7"));
        assert!(html.contains("alert alert-success"));
        assert!(html.contains(r#"action="/imovel-guide/cadastrar""#));
    }

    #[test]
    fn edit_form_posts_to_update_route() {
        let site = site();
        let page = Page {
            site: &site,
            host: "localhost",
            flash: None,
        };
        let form = BrokerForm {
            id: Some(4),
            cpf: Some("52998224725".to_string()),
            creci: Some("\"x\"".to_string()),
            name: Some("Bia".to_string()),
        };

        let html = index_page(&page, &[], &form, false);
        assert!(html.contains(r#"action="/imovel-guide/salvar-edicao/4""#));
        assert!(html.contains("value=\"&#34;x&#34;\""));
        assert!(html.contains("Nenhum corretor cadastrado."));
    }

    #[test]
    fn failed_list_shows_error() {
        let site = site();
        let page = Page {
            site: &site,
            host: "example.com",
            flash: None,
        };
        let html = index_page(&page, &[], &BrokerForm::default(), true);
        assert!(html.contains("alert alert-danger"));
        assert!(html.contains("https://imovelguide.glaucopereira.com/"));
    }
}
