// src/views/execucao.rs

use axum::response::Html;

use crate::{
    common::format::{escapar_html as esc, formatar_datetime_local, formatar_moeda, normalizar_data_hora},
    models::{
        execucao::{MaterialEstoque, MaterialUtilizado, StatusExecucao, TipoMaterial},
        usuarios::User,
    },
    services::execucao_service::FormularioExecucao,
    views::layout::{opt, render_page},
};

const CSS: &str = r#"
    .execucao-datas { display: flex; gap: 16px; flex-wrap: wrap; }
    .materiais td input, .materiais td select { width: 100%; box-sizing: border-box; }
    .materiais .num { width: 110px; }
    .materiais .total { text-align: right; white-space: nowrap; font-weight: 500; }
    .total-geral { text-align: right; font-size: 1.2em; font-weight: 700; margin-top: 10px; }
    .acoes-execucao { display: flex; gap: 10px; justify-content: flex-end; margin-top: 16px; }
"#;

const JS: &str = r#"
    function osId() { return document.getElementById('execucao').dataset.osId; }

    function formatarMoeda(v) { return 'R$ ' + Number(v).toFixed(2).replace('.', ','); }

    function dadosLinha(tr) {
        const tipo = tr.querySelector('[name=tipo_material]').value;
        const estoque = tr.querySelector('[name=material_estoque_id]').value;
        return {
            id: tr.dataset.id ? Number(tr.dataset.id) : null,
            tipo_material: tipo,
            material_estoque_id: tipo === 'estoque' && estoque ? Number(estoque) : null,
            descricao: tr.querySelector('[name=descricao]').value || null,
            quantidade: tr.querySelector('[name=quantidade]').value || '0',
            valor_unitario: tr.querySelector('[name=valor_unitario]').value || '0',
        };
    }

    function ajustarTipo(tr) {
        const estoque = tr.querySelector('[name=tipo_material]').value === 'estoque';
        tr.querySelector('[name=material_estoque_id]').style.display = estoque ? '' : 'none';
        tr.querySelector('[name=descricao]').style.display = estoque ? 'none' : '';
        tr.querySelector('[name=valor_unitario]').readOnly = estoque;
    }

    function somarTotal() {
        let soma = 0;
        document.querySelectorAll('#materiais-corpo tr').forEach(tr => { soma += Number(tr.dataset.total || 0); });
        document.getElementById('total-geral').textContent = formatarMoeda(soma);
    }

    async function recalcular(tr) {
        ajustarTipo(tr);
        const r = await fetch('/execucao/calcular', {
            method: 'POST', credentials: 'same-origin',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(dadosLinha(tr)),
        });
        const d = await r.json().catch(() => ({}));
        if (!d.success) return;
        const linha = d.dados;
        if (tr.querySelector('[name=tipo_material]').value === 'estoque') {
            tr.querySelector('[name=valor_unitario]').value = linha.valor_unitario;
        }
        tr.dataset.total = linha.valor_total;
        tr.querySelector('.total').textContent = linha.valor_total_formatado;
        somarTotal();
    }

    function ligarLinha(tr) {
        tr.querySelectorAll('input, select').forEach(el => el.addEventListener('change', () => recalcular(tr)));
        tr.querySelectorAll('input').forEach(el => el.addEventListener('input', () => recalcular(tr)));
        ajustarTipo(tr);
    }

    function adicionarMaterial() {
        const tpl = document.getElementById('tpl-material');
        const tr = tpl.content.firstElementChild.cloneNode(true);
        document.getElementById('materiais-corpo').appendChild(tr);
        ligarLinha(tr);
    }

    async function removerMaterial(botao) {
        const tr = botao.closest('tr');
        if (tr.dataset.id) {
            if (!confirm('Remover este material da execução?')) return;
            const r = await enviarAcao('DELETE', `/execucao/materiais/${tr.dataset.id}`);
            if (!r.success) return;
        }
        tr.remove();
        somarTotal();
    }

    function dadosFormulario() {
        const f = document.getElementById('form-execucao');
        return {
            data_inicio: f.data_inicio.value || null,
            data_fim: f.data_fim.value || null,
            lista_execucao_status: f.lista_execucao_status.value,
            observacoes: f.observacoes.value || null,
            materiais: [...document.querySelectorAll('#materiais-corpo tr')].map(dadosLinha),
        };
    }

    async function salvarExecucao() {
        const r = await enviarAcao('POST', `/execucao/${osId()}`, dadosFormulario());
        if (r.success) setTimeout(() => location.reload(), 800);
    }

    async function encerrarOs() {
        if (!confirm('Encerrar esta OS? A execução será salva antes.')) return;
        const r = await enviarAcao('POST', `/execucao/${osId()}/encerrar`, dadosFormulario());
        if (r.success) setTimeout(() => location.reload(), 800);
    }

    document.addEventListener('DOMContentLoaded', () => {
        document.querySelectorAll('#materiais-corpo tr').forEach(ligarLinha);
        somarTotal();
    });
"#;

fn datetime_local(valor: Option<&str>) -> String {
    valor
        .and_then(|v| normalizar_data_hora(v).ok())
        .map(formatar_datetime_local)
        .unwrap_or_default()
}

fn opcoes_estoque(estoque: &[MaterialEstoque], selecionado: Option<i64>) -> String {
    let mut html = String::from(r#"<option value="">Selecione...</option>"#);
    for m in estoque {
        let sel = if Some(m.id) == selecionado { " selected" } else { "" };
        let codigo = m.codigo.as_deref().map(|c| format!("{} - ", esc(c))).unwrap_or_default();
        html.push_str(&format!(
            r#"<option value="{id}"{sel}>{codigo}{descricao} ({preco})</option>"#,
            id = m.id,
            descricao = esc(&m.descricao),
            preco = formatar_moeda(m.valor_unitario),
        ));
    }
    html
}

fn linha_material(m: &MaterialUtilizado, estoque: &[MaterialEstoque]) -> String {
    let (sel_estoque, sel_avulso) = match m.tipo_material {
        TipoMaterial::Estoque => (" selected", ""),
        TipoMaterial::Avulso => ("", " selected"),
    };
    let id_attr = m.id.map(|id| format!(r#" data-id="{id}""#)).unwrap_or_default();
    format!(
        r#"<tr{id_attr} data-total="{total}">
            <td><select name="tipo_material"><option value="estoque"{sel_estoque}>Estoque</option><option value="avulso"{sel_avulso}>Avulso</option></select></td>
            <td>
                <select name="material_estoque_id">{opcoes}</select>
                <input name="descricao" value="{descricao}" placeholder="Descrição do material">
            </td>
            <td class="num"><input name="quantidade" type="number" step="any" min="0" value="{quantidade}"></td>
            <td class="num"><input name="valor_unitario" type="number" step="0.01" min="0" value="{unitario}"></td>
            <td class="total">{total_fmt}</td>
            <td><button type="button" class="btn btn-sm btn-perigo" onclick="removerMaterial(this)">✕</button></td>
        </tr>"#,
        total = m.valor_total,
        opcoes = opcoes_estoque(estoque, m.material_estoque_id),
        descricao = esc(m.descricao.as_deref().unwrap_or("")),
        quantidade = m.quantidade,
        unitario = m.valor_unitario,
        total_fmt = formatar_moeda(m.valor_total),
    )
}

pub fn execucao_page(usuario: &User, form: &FormularioExecucao) -> Html<String> {
    let os = &form.ordem;
    let e = &form.execucao;
    let linhas: String = form.materiais.iter().map(|m| linha_material(m, &form.estoque)).collect();
    let vazio = MaterialUtilizado { quantidade: 1.into(), ..Default::default() };
    let (conforme, nao_conforme) = match e.lista_execucao_status {
        StatusExecucao::Conforme => (" selected", ""),
        StatusExecucao::NaoConforme => ("", " selected"),
    };

    let content = format!(
        r#"
        <style>{CSS}</style>
        <div id="execucao" data-os-id="{os_id}">
            <h1>Execução da OS #{os_id}</h1>
            <div class="card">
                <p><strong>{descricao}</strong></p>
                <p class="muted">Status: {status} · Oficina: {oficina} · Responsável: {responsavel}</p>
            </div>
            <form id="form-execucao" class="card" onsubmit="event.preventDefault(); salvarExecucao();">
                <div class="execucao-datas">
                    <div><label>Início</label><input type="datetime-local" name="data_inicio" value="{inicio}"></div>
                    <div><label>Término</label><input type="datetime-local" name="data_fim" value="{fim}"></div>
                    <div><label>Lista de execução</label>
                        <select name="lista_execucao_status">
                            <option value="conforme"{conforme}>{rot_conforme}</option>
                            <option value="nao_conforme"{nao_conforme}>{rot_nao_conforme}</option>
                        </select>
                    </div>
                </div>
                <label>Observações</label>
                <textarea name="observacoes" rows="4" style="width:100%">{observacoes}</textarea>
            </form>
            <div class="card">
                <h3>Materiais utilizados</h3>
                <table class="materiais">
                    <thead><tr><th>Tipo</th><th>Material</th><th>Qtd.</th><th>Valor unit.</th><th>Total</th><th></th></tr></thead>
                    <tbody id="materiais-corpo">{linhas}</tbody>
                </table>
                <button type="button" class="btn btn-neutro" style="margin-top:8px" onclick="adicionarMaterial()">+ Material</button>
                <div class="total-geral">Total: <span id="total-geral">{total}</span></div>
            </div>
            <div class="acoes-execucao">
                <button class="btn" onclick="salvarExecucao()">Salvar</button>
                <button class="btn btn-ok" onclick="encerrarOs()">Encerrar OS</button>
            </div>
        </div>
        <template id="tpl-material">{modelo}</template>
        <script>{JS}</script>
        "#,
        os_id = os.id,
        descricao = esc(&os.descricao),
        status = os.status.rotulo(),
        oficina = opt(os.oficina.as_deref()),
        responsavel = opt(os.usuario_responsavel.as_deref()),
        inicio = datetime_local(e.data_inicio.as_deref()),
        fim = datetime_local(e.data_fim.as_deref()),
        rot_conforme = StatusExecucao::Conforme.rotulo(),
        rot_nao_conforme = StatusExecucao::NaoConforme.rotulo(),
        observacoes = esc(e.observacoes.as_deref().unwrap_or("")),
        total = formatar_moeda(form.total),
        modelo = linha_material(&vazio, &form.estoque),
    );
    render_page(&format!("Execução OS #{}", os.id), Some(usuario), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{execucao::ExecucaoOs, ordens::OrdemServico};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn formulario() -> FormularioExecucao {
        let catalogo = vec![MaterialEstoque { id: 1, descricao: "Rolamento".into(), valor_unitario: Decimal::from_str("25.9").unwrap(), ..Default::default() }];
        let material = MaterialUtilizado {
            id: Some(90),
            tipo_material: TipoMaterial::Estoque,
            material_estoque_id: Some(1),
            quantidade: Decimal::from(2),
            valor_unitario: Decimal::from_str("25.9").unwrap(),
            valor_total: Decimal::from_str("51.8").unwrap(),
            ..Default::default()
        };
        FormularioExecucao {
            ordem: OrdemServico { id: 4, descricao: "Troca".into(), ..Default::default() },
            execucao: ExecucaoOs { os_id: 4, data_inicio: Some("2025-03-10 08:00:00".into()), ..Default::default() },
            materiais: vec![material],
            estoque: catalogo,
            total: Decimal::from_str("51.8").unwrap(),
        }
    }

    #[test]
    fn prefills_dates_and_totals() {
        let Html(html) = execucao_page(&User::default(), &formulario());
        assert!(html.contains(r#"name="data_inicio" value="2025-03-10T08:00""#));
        assert!(html.contains(r#"name="data_fim" value="""#));
        assert!(html.contains(r#"<span id="total-geral">R$ 51,80</span>"#));
        assert!(html.contains(r#"<option value="1" selected>Rolamento (R$ 25,90)</option>"#));
        assert!(html.contains(r#"data-id="90""#));
    }
}
