// src/views/usuarios.rs

use axum::response::Html;

use crate::{
    common::format::escapar_html as esc,
    models::usuarios::{Perfil, StatusUsuario, User},
    views::layout::{opt, render_page},
};

const JS: &str = r#"
    function novoUsuario() {
        const f = document.getElementById('form-usuario');
        f.reset();
        f.dataset.id = '';
        f.password.required = true;
        document.getElementById('titulo-usuario').textContent = 'Novo usuário';
        abrirModal('modal-usuario');
    }

    function editarUsuario(botao) {
        const u = JSON.parse(botao.dataset.usuario);
        const f = document.getElementById('form-usuario');
        f.reset();
        for (const k of ['name', 'email', 'company', 'cargo', 'profile', 'status']) f[k].value = u[k] ?? '';
        f.password.required = false;
        f.dataset.id = u.id;
        document.getElementById('titulo-usuario').textContent = 'Editar usuário';
        abrirModal('modal-usuario');
    }

    async function salvarUsuario(ev) {
        ev.preventDefault();
        const f = ev.target;
        const dados = Object.fromEntries(new FormData(f).entries());
        for (const k of ['password', 'company', 'cargo']) if (!dados[k]) dados[k] = null;
        const r = f.dataset.id
            ? await enviarAcao('PUT', `/usuarios/${f.dataset.id}`, dados)
            : await enviarAcao('POST', '/usuarios', dados);
        if (r.success) { fecharModal('modal-usuario'); setTimeout(() => location.reload(), 800); }
    }

    async function excluirUsuario(id, nome) {
        if (!confirm(`Excluir o usuário ${nome}?`)) return;
        const r = await enviarAcao('DELETE', `/usuarios/${id}`);
        if (r.success) document.getElementById(`usuario-${id}`)?.remove();
    }
"#;

fn opcoes_perfil() -> String {
    [Perfil::User, Perfil::Admin, Perfil::Master]
        .iter()
        .map(|p| {
            let valor = serde_json::to_value(p).ok().and_then(|v| v.as_str().map(String::from)).unwrap_or_default();
            format!(r#"<option value="{valor}">{}</option>"#, p.rotulo())
        })
        .collect()
}

/// Tabela de usuários; os botões de alteração só aparecem para `master`.
pub fn usuarios_page(usuario: &User, usuarios: &[User], pode_gerenciar: bool) -> Html<String> {
    let linhas: String = usuarios
        .iter()
        .map(|u| {
            let acoes = if pode_gerenciar {
                let json = serde_json::to_string(u).unwrap_or_default();
                format!(
                    r#"<button class="btn btn-sm" data-usuario="{json}" onclick="editarUsuario(this)">Editar</button>
                       <button class="btn btn-sm btn-perigo" onclick="excluirUsuario({id}, '{nome_js}')">Excluir</button>"#,
                    json = esc(&json),
                    id = u.id,
                    nome_js = esc(&u.name.replace('\\', "\\\\").replace('\'', "\\'")),
                )
            } else {
                String::new()
            };
            let status = match u.status {
                StatusUsuario::Active => "Ativo",
                StatusUsuario::Inactive => "Inativo",
            };
            format!(
                r#"<tr id="usuario-{id}">
                    <td>{nome}</td><td>{email}</td><td>{empresa}</td><td>{cargo}</td><td>{perfil}</td><td>{status}</td>
                    <td style="white-space:nowrap">{acoes}</td>
                </tr>"#,
                id = u.id,
                nome = esc(&u.name),
                email = esc(&u.email),
                empresa = opt(u.company.as_deref()),
                cargo = opt(u.cargo.as_deref()),
                perfil = u.profile.rotulo(),
            )
        })
        .collect();

    let novo = if pode_gerenciar {
        r#"<button class="btn btn-ok" onclick="novoUsuario()">+ Novo usuário</button>"#
    } else {
        r#"<span class="muted">Somente o perfil Master altera usuários.</span>"#
    };

    let content = format!(
        r#"
        <h1>Usuários</h1>
        <div class="card">
            <div style="margin-bottom:12px">{novo}</div>
            <table>
                <thead><tr><th>Nome</th><th>E-mail</th><th>Empresa</th><th>Cargo</th><th>Perfil</th><th>Status</th><th></th></tr></thead>
                <tbody>{linhas}</tbody>
            </table>
        </div>

        <div class="modal-fundo" id="modal-usuario">
            <div class="modal">
                <h2 id="titulo-usuario">Novo usuário</h2>
                <form id="form-usuario" onsubmit="salvarUsuario(event)">
                    <label>Nome</label><input name="name" required style="width:100%">
                    <label>E-mail</label><input name="email" type="email" required style="width:100%">
                    <label>Senha (mínimo 6 caracteres; em branco mantém a atual)</label><input name="password" type="password" minlength="6" style="width:100%">
                    <label>Empresa</label><input name="company" style="width:100%">
                    <label>Cargo</label><input name="cargo" style="width:100%">
                    <label>Perfil</label><select name="profile">{perfis}</select>
                    <label>Status</label><select name="status"><option value="active">Ativo</option><option value="inactive">Inativo</option></select>
                    <div style="margin-top:12px; text-align:right">
                        <button type="button" class="btn btn-neutro" onclick="fecharModal('modal-usuario')">Cancelar</button>
                        <button class="btn btn-ok" type="submit">Salvar</button>
                    </div>
                </form>
            </div>
        </div>
        <script>{JS}</script>
        "#,
        perfis = opcoes_perfil(),
    );
    render_page("Usuários", Some(usuario), content)
}
