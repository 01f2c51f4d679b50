// src/views/arvore.rs

use axum::response::Html;

use crate::{
    common::format::escapar_html as esc,
    models::{
        ativos::{Equipamento, Filial, Setor, TipoNo},
        usuarios::User,
    },
    services::arvore_service::{DetalheNo, NoFilial},
    views::layout::{opt, render_page},
};

const CSS: &str = r#"
    .arvore details { margin-left: 18px; }
    .arvore summary { cursor: pointer; padding: 4px 0; }
    .arvore .no { display: inline-flex; gap: 8px; align-items: center; }
    .arvore .tag { font-weight: 700; color: var(--primary-dark); }
    .arvore .equip { margin-left: 36px; padding: 3px 0; display: flex; gap: 8px; align-items: center; }
    .arvore .vazio { margin-left: 36px; }
"#;

fn botoes(tipo: TipoNo, id: i64, pode_excluir: bool) -> String {
    let t = match tipo {
        TipoNo::Filial => "filial",
        TipoNo::Setor => "setor",
        TipoNo::Equipamento => "equipamento",
    };
    let excluir = if pode_excluir {
        format!(r#"<button class="btn btn-sm btn-perigo" onclick="event.preventDefault(); excluirNo('{t}', {id})">Excluir</button>"#)
    } else {
        String::new()
    };
    format!(
        r#"<button class="btn btn-sm btn-neutro" onclick="event.preventDefault(); verNo('{t}', {id})">Info</button>
           <button class="btn btn-sm" onclick="event.preventDefault(); editarNo('{t}', {id})">Editar</button>
           {excluir}"#
    )
}

fn render_equipamento(e: &Equipamento, pode_excluir: bool) -> String {
    format!(
        r#"<div class="equip" id="no-equipamento-{id}"><span class="tag">{tag}</span> {descricao} {botoes}</div>"#,
        id = e.id,
        tag = esc(&e.tag),
        descricao = esc(&e.descricao),
        botoes = botoes(TipoNo::Equipamento, e.id, pode_excluir),
    )
}

pub fn render_arvore(arvore: &[NoFilial], pode_excluir: bool) -> String {
    let mut html = String::new();
    for no in arvore {
        let mut setores_html = String::new();
        for s in &no.setores {
            let equipamentos: String = if s.equipamentos.is_empty() {
                r#"<div class="vazio muted">Nenhum equipamento</div>"#.to_string()
            } else {
                s.equipamentos.iter().map(|e| render_equipamento(e, pode_excluir)).collect()
            };
            setores_html.push_str(&format!(
                r#"<details open id="no-setor-{id}">
                    <summary><span class="no"><span class="tag">{tag}</span> {descricao} {botoes}</span></summary>
                    {equipamentos}
                </details>"#,
                id = s.setor.id,
                tag = esc(&s.setor.tag),
                descricao = esc(&s.setor.descricao),
                botoes = botoes(TipoNo::Setor, s.setor.id, pode_excluir),
            ));
        }
        if no.setores.is_empty() {
            setores_html.push_str(r#"<div class="vazio muted">Nenhum setor</div>"#);
        }
        html.push_str(&format!(
            r#"<details open id="no-filial-{id}">
                <summary><span class="no"><span class="tag">{tag}</span> {descricao} {botoes}</span></summary>
                {setores_html}
            </details>"#,
            id = no.filial.id,
            tag = esc(&no.filial.tag),
            descricao = esc(&no.filial.descricao),
            botoes = botoes(TipoNo::Filial, no.filial.id, pode_excluir),
        ));
    }
    if arvore.is_empty() {
        html.push_str(r#"<p class="muted">Nenhuma filial cadastrada.</p>"#);
    }
    html
}

pub fn arvore_page(usuario: &User, arvore: &[NoFilial], pode_excluir: bool) -> Html<String> {
    let content = format!(
        r#"
        <style>{CSS}</style>
        <h1>Árvore de Ativos</h1>
        <div class="card arvore" id="arvore">{arvore}</div>

        <div class="modal-fundo" id="modal-no">
            <div class="modal">
                <div id="modal-no-corpo"></div>
                <div style="text-align:right; margin-top: 12px;">
                    <button class="btn btn-neutro" onclick="fecharModal('modal-no')">Fechar</button>
                </div>
            </div>
        </div>

        <script>
            async function verNo(tipo, id) {{
                const r = await fetch(`/ativos/${{tipo}}/${{id}}`, {{ credentials: 'same-origin' }});
                const d = await r.json();
                if (!d.success) {{ showNotification(d.message || d.error, 'error'); return; }}
                document.getElementById('modal-no-corpo').innerHTML = d.html;
                abrirModal('modal-no');
            }}

            async function editarNo(tipo, id) {{
                const r = await fetch(`/ativos/${{tipo}}/${{id}}/editar`, {{ credentials: 'same-origin' }});
                const d = await r.json();
                if (!d.success) {{ showNotification(d.message || d.error, 'error'); return; }}
                document.getElementById('modal-no-corpo').innerHTML = d.html;
                abrirModal('modal-no');
            }}

            async function salvarNo(ev, tipo, id) {{
                ev.preventDefault();
                const dados = Object.fromEntries(new FormData(ev.target).entries());
                dados.tipo = tipo;
                for (const k of Object.keys(dados)) if (dados[k] === '' && k !== 'tag' && k !== 'descricao') delete dados[k];
                for (const k of ['filial_id', 'setor_id']) if (dados[k] !== undefined) dados[k] = Number(dados[k]);
                const r = await enviarAcao('PUT', `/ativos/${{tipo}}/${{id}}`, dados);
                if (r.success) {{ fecharModal('modal-no'); if (r.html) document.getElementById('arvore').innerHTML = r.html; }}
            }}

            async function excluirNo(tipo, id) {{
                if (!confirm(`Deseja realmente excluir este(a) ${{tipo}}?`)) return;
                let r = await enviarAcao('DELETE', `/ativos/${{tipo}}/${{id}}`);
                if (!r.success && r.status === 409) {{
                    if (!confirm(r.message || r.error)) return;
                    r = await enviarAcao('DELETE', `/ativos/${{tipo}}/${{id}}?confirmar=true`);
                }}
                if (r.success && r.html) document.getElementById('arvore').innerHTML = r.html;
            }}
        </script>
        "#,
        arvore = render_arvore(arvore, pode_excluir),
    );
    render_page("Árvore de Ativos", Some(usuario), content)
}

fn linha(rotulo: &str, valor: String) -> String {
    format!("<tr><th>{}</th><td>{}</td></tr>", rotulo, valor)
}

pub fn fragmento_detalhes(detalhe: &DetalheNo) -> String {
    let mut linhas = String::new();
    let titulo = match detalhe {
        DetalheNo::Filial { filial } => {
            linhas.push_str(&linha("TAG", esc(&filial.tag)));
            linhas.push_str(&linha("Descrição", esc(&filial.descricao)));
            linhas.push_str(&linha("Endereço", opt(filial.endereco.as_deref())));
            linhas.push_str(&linha("Cidade/UF", format!("{} / {}", opt(filial.cidade.as_deref()), opt(filial.estado.as_deref()))));
            linhas.push_str(&linha("E-mail", opt(filial.email.as_deref())));
            linhas.push_str(&linha("Telefone", opt(filial.telefone.as_deref())));
            linhas.push_str(&linha("CNPJ", opt(filial.cnpj.as_deref())));
            "Filial"
        }
        DetalheNo::Setor { setor, filial } => {
            linhas.push_str(&linha("TAG", esc(&setor.tag)));
            linhas.push_str(&linha("Descrição", esc(&setor.descricao)));
            linhas.push_str(&linha("Filial", opt(filial.as_ref().map(|f| f.tag.as_str()))));
            "Setor"
        }
        DetalheNo::Equipamento { equipamento, setor, filial } => {
            linhas.push_str(&linha("TAG", esc(&equipamento.tag)));
            linhas.push_str(&linha("Descrição", esc(&equipamento.descricao)));
            linhas.push_str(&linha("Setor", opt(setor.as_ref().map(|s| s.tag.as_str()))));
            linhas.push_str(&linha("Filial", opt(filial.as_ref().map(|f| f.tag.as_str()))));
            linhas.push_str(&linha(
                "Plano de manutenção",
                format!(r#"<a href="/pmp/equipamento/{}">Abrir PMP</a>"#, equipamento.id),
            ));
            "Equipamento"
        }
    };
    format!("<h2>{titulo}</h2><table>{linhas}</table>")
}

fn campo(nome: &str, rotulo: &str, valor: &str) -> String {
    format!(
        r#"<label>{rotulo}</label><input name="{nome}" value="{valor}" style="width:100%">"#,
        valor = esc(valor)
    )
}

fn opcoes<'a>(itens: impl Iterator<Item = (i64, &'a str)>, selecionado: Option<i64>) -> String {
    itens
        .map(|(id, tag)| {
            let sel = if Some(id) == selecionado { " selected" } else { "" };
            format!(r#"<option value="{id}"{sel}>{}</option>"#, esc(tag))
        })
        .collect()
}

/// Formulário de edição pré-preenchido; `None` se o nó não existe nas listas.
pub fn fragmento_edicao(
    tipo: TipoNo,
    id: i64,
    filiais: &[Filial],
    setores: &[Setor],
    equipamentos: &[Equipamento],
) -> Option<String> {
    let (titulo, campos) = match tipo {
        TipoNo::Filial => {
            let f = filiais.iter().find(|f| f.id == id)?;
            let campos = [
                campo("tag", "TAG", &f.tag),
                campo("descricao", "Descrição", &f.descricao),
                campo("endereco", "Endereço", f.endereco.as_deref().unwrap_or("")),
                campo("cidade", "Cidade", f.cidade.as_deref().unwrap_or("")),
                campo("estado", "UF", f.estado.as_deref().unwrap_or("")),
                campo("email", "E-mail", f.email.as_deref().unwrap_or("")),
                campo("telefone", "Telefone", f.telefone.as_deref().unwrap_or("")),
                campo("cnpj", "CNPJ", f.cnpj.as_deref().unwrap_or("")),
            ]
            .concat();
            ("Editar filial", campos)
        }
        TipoNo::Setor => {
            let s = setores.iter().find(|s| s.id == id)?;
            let campos = format!(
                r#"{}{}<label>Filial</label><select name="filial_id">{}</select>"#,
                campo("tag", "TAG", &s.tag),
                campo("descricao", "Descrição", &s.descricao),
                opcoes(filiais.iter().map(|f| (f.id, f.tag.as_str())), s.filial_id),
            );
            ("Editar setor", campos)
        }
        TipoNo::Equipamento => {
            let e = equipamentos.iter().find(|e| e.id == id)?;
            let campos = format!(
                r#"{}{}<label>Setor</label><select name="setor_id">{}</select>"#,
                campo("tag", "TAG", &e.tag),
                campo("descricao", "Descrição", &e.descricao),
                opcoes(setores.iter().map(|s| (s.id, s.tag.as_str())), e.setor_id),
            );
            ("Editar equipamento", campos)
        }
    };

    let t = match tipo {
        TipoNo::Filial => "filial",
        TipoNo::Setor => "setor",
        TipoNo::Equipamento => "equipamento",
    };
    Some(format!(
        r#"<h2>{titulo}</h2>
        <form onsubmit="salvarNo(event, '{t}', {id})">
            {campos}
            <div style="margin-top:12px"><button class="btn btn-ok" type="submit">Salvar</button></div>
        </form>"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::arvore_service::{montar_arvore, NoSetor};

    fn arvore() -> Vec<NoFilial> {
        vec![NoFilial {
            filial: Filial { id: 1, tag: "F01".into(), descricao: "Matriz & Cia".into(), ..Default::default() },
            setores: vec![NoSetor {
                setor: Setor { id: 3, tag: "S03".into(), filial_id: Some(1), ..Default::default() },
                equipamentos: vec![Equipamento { id: 7, tag: "<EB01>".into(), setor_id: Some(3), ..Default::default() }],
            }],
        }]
    }

    #[test]
    fn tree_is_expanded_and_escaped() {
        let html = render_arvore(&arvore(), false);
        assert!(html.contains(r#"<details open id="no-filial-1">"#));
        assert!(html.contains("Matriz &amp; Cia"));
        assert!(html.contains("&lt;EB01&gt;"));
        assert!(!html.contains("excluirNo"));
    }

    #[test]
    fn delete_button_only_for_privileged() {
        let html = render_arvore(&arvore(), true);
        assert!(html.contains("excluirNo('filial', 1)"));
        assert!(html.contains("excluirNo('equipamento', 7)"));
    }

    #[test]
    fn edit_form_preselects_parent() {
        let filiais = vec![Filial { id: 1, tag: "F01".into(), ..Default::default() }, Filial { id: 2, tag: "F02".into(), ..Default::default() }];
        let setores = vec![Setor { id: 3, tag: "S03".into(), filial_id: Some(2), ..Default::default() }];
        let html = fragmento_edicao(TipoNo::Setor, 3, &filiais, &setores, &[]).unwrap();
        assert!(html.contains(r#"<option value="2" selected>F02</option>"#));
        assert!(fragmento_edicao(TipoNo::Setor, 99, &filiais, &setores, &[]).is_none());
        let vazio = montar_arvore(vec![], vec![], vec![]);
        assert!(render_arvore(&vazio, false).contains("Nenhuma filial"));
    }
}
