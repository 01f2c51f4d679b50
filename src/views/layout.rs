// src/views/layout.rs

use axum::response::Html;

use crate::{common::format::escapar_html as esc, models::usuarios::User};

const CSS: &str = r#"
    :root {
        --primary-color: #1565c0;
        --primary-dark: #0d47a1;
        --background-color: #f4f6f8;
        --card-background: #ffffff;
        --text-color: #212121;
        --text-light: #757575;
        --border-color: #e0e0e0;
        --shadow: 0 2px 4px rgba(0,0,0,0.1), 0 2px 10px rgba(0,0,0,0.08);
        --success-color: #2e7d32;
        --danger-color: #c62828;
        --warning-color: #ef6c00;
    }
    body {
        font-family: 'Roboto', -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
        background-color: var(--background-color);
        color: var(--text-color);
        margin: 0;
        line-height: 1.5;
    }
    nav { background: var(--primary-dark); padding: 10px 20px; display: flex; gap: 18px; align-items: center; }
    nav a { color: #fff; text-decoration: none; font-weight: 500; }
    nav .usuario { margin-left: auto; color: #bbdefb; font-size: 14px; }
    .container { max-width: 1400px; margin: 20px auto; padding: 0 15px; }
    .card { background: var(--card-background); border-radius: 8px; box-shadow: var(--shadow); padding: 20px; margin-bottom: 20px; }
    h1 { color: var(--primary-dark); margin-top: 0; }
    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid var(--border-color); vertical-align: top; }
    th { background: #f8f9fa; font-weight: 500; color: var(--primary-dark); }
    .btn { padding: 6px 14px; border: none; border-radius: 4px; cursor: pointer; font-weight: 500; color: #fff; background: var(--primary-color); text-decoration: none; display: inline-block; }
    .btn:hover { background: var(--primary-dark); }
    .btn-sm { padding: 3px 8px; font-size: 12px; }
    .btn-perigo { background: var(--danger-color); }
    .btn-neutro { background: var(--text-light); }
    .btn-ok { background: var(--success-color); }
    input, select, textarea { padding: 6px 8px; border: 1px solid var(--border-color); border-radius: 4px; font: inherit; }
    label { display: block; font-size: 13px; color: var(--text-light); margin-top: 8px; }
    .muted { color: var(--text-light); font-size: 13px; }
    .notification { position: fixed; top: 20px; right: 20px; padding: 15px; border-radius: 5px; color: white; z-index: 1000; display: none; box-shadow: 0 4px 10px rgba(0,0,0,0.2); max-width: 420px; }
    .notification.success { background: var(--success-color); }
    .notification.error { background: var(--danger-color); }
    .modal-fundo { position: fixed; inset: 0; background: rgba(0,0,0,0.4); display: none; align-items: center; justify-content: center; z-index: 900; }
    .modal-fundo.aberto { display: flex; }
    .modal { background: #fff; border-radius: 8px; padding: 20px; min-width: 380px; max-width: 640px; max-height: 85vh; overflow: auto; }
    .erro-pagina { text-align: center; padding: 60px 20px; }
    .erro-pagina p { color: var(--text-light); }
"#;

/// Funções comuns a todas as páginas: toast e envio de ações.
const JS_COMUM: &str = r#"
    function showNotification(message, type) {
        const n = document.getElementById('notification');
        n.textContent = message;
        n.className = 'notification ' + type;
        n.style.display = 'block';
        clearTimeout(n._timer);
        n._timer = setTimeout(() => { n.style.display = 'none'; }, 4000);
    }

    async function enviarAcao(metodo, url, corpo) {
        try {
            const opts = { method: metodo, headers: { 'Content-Type': 'application/json' }, credentials: 'same-origin' };
            if (corpo !== undefined) opts.body = JSON.stringify(corpo);
            const resp = await fetch(url, opts);
            const dados = await resp.json().catch(() => ({ success: false, message: 'Resposta inválida do servidor.' }));
            if (!resp.ok || !dados.success) {
                dados.success = false;
                dados.status = resp.status;
                showNotification(dados.message || dados.error || 'Falha na operação.', 'error');
            } else if (dados.message) {
                showNotification(dados.message, 'success');
            }
            return dados;
        } catch (e) {
            showNotification('Não foi possível comunicar com o servidor.', 'error');
            return { success: false };
        }
    }

    function abrirModal(id) { document.getElementById(id).classList.add('aberto'); }
    function fecharModal(id) { document.getElementById(id).classList.remove('aberto'); }
"#;

fn nav(usuario: Option<&User>) -> String {
    let quem = usuario
        .map(|u| format!(r#"<span class="usuario">{} ({})</span>"#, esc(&u.name), u.profile.rotulo()))
        .unwrap_or_default();
    format!(
        r#"<nav>
            <a href="/programacao">Programação</a>
            <a href="/ativos">Ativos</a>
            <a href="/pmp">PMP</a>
            <a href="/qrcodes">QR Codes</a>
            <a href="/qrcodes/scanner">Scanner</a>
            <a href="/usuarios">Usuários</a>
            {quem}
        </nav>"#
    )
}

pub fn render_page(title: &str, usuario: Option<&User>, content: String) -> Html<String> {
    Html(format!(
        r#"
        <!DOCTYPE html>
        <html lang="pt-BR">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>{title}</title>
            <style>{CSS}</style>
            <script>{JS_COMUM}</script>
        </head>
        <body>
            {nav}
            <div id="notification" class="notification"></div>
            <div class="container">
                {content}
            </div>
        </body>
        </html>
        "#,
        title = esc(title),
        nav = nav(usuario),
    ))
}

/// Tela de falha de carregamento com o botão de nova tentativa.
pub fn pagina_erro(mensagem: &str, tentar_novamente: &str) -> Html<String> {
    let content = format!(
        r#"
        <div class="card erro-pagina">
            <h1>Não foi possível carregar</h1>
            <p>{mensagem}</p>
            <a class="btn" href="{url}">Tentar novamente</a>
        </div>
        "#,
        mensagem = esc(mensagem),
        url = esc(tentar_novamente),
    );
    render_page("Erro", None, content)
}

/// Texto opcional do backend já escapado, com traço quando vazio.
pub fn opt(valor: Option<&str>) -> String {
    match valor.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => esc(v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_offers_retry() {
        let Html(html) = pagina_erro("Backend fora <do ar>", "/programacao?semana=2025-03-10");
        assert!(html.contains("Tentar novamente"));
        assert!(html.contains("Backend fora &lt;do ar&gt;"));
        assert!(html.contains(r#"href="/programacao?semana=2025-03-10""#));
    }

    #[test]
    fn user_name_is_escaped_in_nav() {
        let u = User { name: "<script>".into(), ..Default::default() };
        let Html(html) = render_page("T", Some(&u), String::new());
        assert!(html.contains(r#"<span class="usuario">&lt;script&gt; (Técnico)</span>"#));
    }
}
