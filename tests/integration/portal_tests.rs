use sigaa_crawler::config::{parse_config, Config};
use sigaa_crawler::models::RecordKind;
use sigaa_crawler::output::load_store_statistics;
use sigaa_crawler::storage::RecordStorage;
use sigaa_crawler::{SigaaClient, SigaaError};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
    <form name="loginForm" action="/sigaa/logar.do?dispatch=logOn" method="post">
      <input type="text" name="user.login"/>
      <input type="password" name="user.senha"/>
    </form>
</body></html>"#;

const SEARCH_PAGE: &str = r#"<html><body>
    <form id="formTurma" name="formTurma" action="/sigaa/public/turmas/listar.jsf" method="post">
      <input type="hidden" name="javax.faces.ViewState" value="j_id3"/>
      <select id="formTurma:inputDepto" name="formTurma:inputDepto">
        <option value="0">-- SELECIONE --</option>
        <option value="1120">DEPTO DE MATEMÁTICA</option>
      </select>
    </form>
</body></html>"#;

const LISTING: &str = r##"<html><body>
    <table id="lista-turmas"><tbody>
      <tr class="destaque"><td colspan="8">MATA01 - CÁLCULO A</td></tr>
      <tr><td>2024.1</td><td><a href="#" onclick="PainelTurma.show(11)">T01</a></td><td></td><td></td><td>Presencial</td><td></td><td>35M12</td><td>PAF I</td></tr>
      <tr><td>2024.1</td><td><a href="#" onclick="PainelTurma.show(12)">T02</a></td><td></td><td></td><td>Presencial</td><td></td><td>24N12</td><td>PAF I</td></tr>
      <tr><td>2024.1</td><td><a href="#" onclick="PainelTurma.show(13)">T03</a></td><td></td><td></td><td>Presencial</td><td></td><td>6T12</td><td>PAF III</td></tr>
    </tbody></table>
</body></html>"##;

fn detail(capacity: u32) -> String {
    format!(
        r#"<div id="resumo"><table><tbody><tr><th>Capacidade:</th><td>{}</td></tr></tbody></table></div>"#,
        capacity
    )
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, data_dir: &Path, password: &str) -> Config {
    parse_config(&format!(
        r#"
        [portal]
        institution = "UFBA"
        base-url = "{}"

        [credentials]
        username = "aluno"
        password = "{}"

        [storage]
        data-dir = "{}"

        [transport]
        timeout-secs = 5
        connect-timeout-secs = 5
        "#,
        base_url,
        password,
        data_dir.display()
    ))
    .expect("test config parses")
}

async fn mount_html(server: &MockServer, verb: &str, at: &str, body: &str) {
    Mock::given(method(verb))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Login handshake, logoff and probe
async fn mount_auth(server: &MockServer, post_body: &str) {
    Mock::given(method("GET"))
        .and(path("/sigaa/logar.do"))
        .and(query_param("dispatch", "logOn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sigaa/logar.do"))
        .and(query_param("dispatch", "logOn"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_body))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sigaa/logar.do"))
        .and(query_param("dispatch", "logOff"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>até logo</p>"))
        .mount(server)
        .await;
    mount_html(server, "GET", "/sigaa/portais/discente/discente.jsf", "<p>portal</p>").await;
}

/// Section search with three sections; `failing` answers HTTP 500
async fn mount_sections(server: &MockServer, failing: Option<&str>) {
    mount_html(server, "GET", "/sigaa/public/turmas/listar.jsf", SEARCH_PAGE).await;
    mount_html(server, "POST", "/sigaa/public/turmas/listar.jsf", LISTING).await;

    for (id, capacity) in [("11", 45), ("12", 30), ("13", 60)] {
        let response = if failing == Some(id) {
            ResponseTemplate::new(500).set_body_string("<p>Erro</p>")
        } else {
            ResponseTemplate::new(200).set_body_string(detail(capacity))
        };
        Mock::given(method("GET"))
            .and(path("/sigaa/graduacao/turma/view_painel.jsf"))
            .and(query_param("id", id))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_sections_crawl_persists_across_clients() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server, "<p>Bem-vindo</p>").await;
    mount_sections(&mock_server, None).await;

    let data_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&mock_server.uri(), data_dir.path(), "segredo");

    let mut client = SigaaClient::from_config(config.clone()).unwrap();
    client.login().await.unwrap();
    assert!(client.session().is_authenticated());

    let outcome = client.get_sections(false).await.unwrap();
    assert!(!outcome.from_store);
    assert_eq!(outcome.report.records.len(), 3);
    assert_eq!(outcome.stored.inserted, 3);
    assert_eq!(outcome.report.records[0].course.code, "MATA01");
    assert_eq!(outcome.report.records[2].seats_count, 60);

    client.logoff().await.unwrap();
    client.close().await;
    drop(client);

    // A fresh client over the same data dir reuses the completed crawl
    let mut client = SigaaClient::from_config(config).unwrap();
    client.login().await.unwrap();
    let after_login = client.requests_issued();

    let stored = client.get_sections(false).await.unwrap();
    assert!(stored.from_store);
    assert_eq!(stored.report.records, outcome.report.records);
    assert_eq!(client.requests_issued(), after_login);

    let tables = load_store_statistics(&client.stores().records).unwrap();
    let sections = tables.iter().find(|t| t.kind == RecordKind::Section).unwrap();
    assert_eq!(sections.records, 3);
    assert!(sections.completed_at.is_some());
}

#[tokio::test]
async fn test_failing_detail_page_skips_only_that_row() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server, "<p>Bem-vindo</p>").await;
    mount_sections(&mock_server, Some("12")).await;

    let data_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&mock_server.uri(), data_dir.path(), "segredo");

    let mut client = SigaaClient::from_config(config).unwrap();
    client.login().await.unwrap();

    let outcome = client.get_sections(false).await.unwrap();
    let ids: Vec<&str> = outcome.report.records.iter().map(|s| s.id_ref.as_str()).collect();
    assert_eq!(ids, vec!["11", "13"]);
    assert_eq!(outcome.report.skipped.len(), 1);
    assert!(!outcome.report.aborted);
    assert!(client.stores().records.contains(RecordKind::Section, "13").unwrap());
    assert!(!client.stores().records.contains(RecordKind::Section, "12").unwrap());
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server, "<p>Usuário e/ou senha inválidos</p>").await;

    let data_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&mock_server.uri(), data_dir.path(), "errada");

    let mut client = SigaaClient::from_config(config).unwrap();
    let err = client.login().await.unwrap_err();

    assert!(matches!(err, SigaaError::Authentication(_)));
    assert!(!client.session().is_authenticated());
    assert!(matches!(
        client.get_sections(false).await,
        Err(SigaaError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_download_attachment_over_http() {
    let mock_server = MockServer::start().await;
    mount_auth(&mock_server, "<p>Bem-vindo</p>").await;
    Mock::given(method("GET"))
        .and(path("/sigaa/arquivos/plano.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&mock_server)
        .await;

    let data_dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&mock_server.uri(), data_dir.path(), "segredo");

    let mut client = SigaaClient::from_config(config).unwrap();
    client.login().await.unwrap();

    let destination = tempfile::tempdir().unwrap();
    let url = format!("{}/sigaa/arquivos/plano.pdf", mock_server.uri());
    let saved = client
        .downloads()
        .unwrap()
        .download_attachment(&url, destination.path())
        .await
        .unwrap();

    assert_eq!(saved, destination.path().join("plano.pdf"));
    assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.4");
}
