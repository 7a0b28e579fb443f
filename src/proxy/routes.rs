use crate::auth::Module;

/// A POST route that validates its body and relays it to one edge function
#[derive(Debug)]
pub struct ProxyRoute {
    pub path: &'static str,
    pub function: &'static str,
    /// Body fields that must be present and non-empty; `bar_id` is always checked
    pub required: &'static [&'static str],
    pub module: Module,
    pub description: &'static str,
}

pub const PROXY_ROUTES: &[ProxyRoute] = &[
    ProxyRoute {
        path: "/api/integracoes/contaazul/sync",
        function: "contaazul-sync",
        required: &["bar_id"],
        module: Module::Financeiro,
        description: "Sincroniza lançamentos com o ContaAzul",
    },
    ProxyRoute {
        path: "/api/integracoes/nibo/sync",
        function: "nibo-sync",
        required: &["bar_id"],
        module: Module::Financeiro,
        description: "Sincroniza agendamentos com o Nibo",
    },
    ProxyRoute {
        path: "/api/integracoes/inter/extrato",
        function: "inter-extrato",
        required: &["bar_id", "data_inicio", "data_fim"],
        module: Module::Financeiro,
        description: "Consulta o extrato do Banco Inter no período",
    },
    ProxyRoute {
        path: "/api/integracoes/inter/pix",
        function: "inter-pix",
        required: &["bar_id", "valor", "chave"],
        module: Module::Financeiro,
        description: "Agenda um pagamento PIX pelo Banco Inter",
    },
    ProxyRoute {
        path: "/api/vendas/sincronizar",
        function: "contahub-sync",
        required: &["bar_id", "data"],
        module: Module::Vendas,
        description: "Importa as vendas do dia a partir do ContaHub",
    },
    ProxyRoute {
        path: "/api/checklists/agendamentos/processar",
        function: "checklist-agendamentos",
        required: &["bar_id"],
        module: Module::Checklists,
        description: "Gera as execuções de checklists agendadas",
    },
];

pub fn find(path: &str) -> Option<&'static ProxyRoute> {
    PROXY_ROUTES.iter().find(|route| route.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_and_functions_are_unique() {
        let paths: HashSet<_> = PROXY_ROUTES.iter().map(|r| r.path).collect();
        let functions: HashSet<_> = PROXY_ROUTES.iter().map(|r| r.function).collect();
        assert_eq!(paths.len(), PROXY_ROUTES.len());
        assert_eq!(functions.len(), PROXY_ROUTES.len());
    }

    #[test]
    fn every_route_is_bar_scoped() {
        for route in PROXY_ROUTES {
            assert!(route.path.starts_with("/api/"), "{}", route.path);
            assert!(route.required.contains(&"bar_id"), "{} must require bar_id", route.path);
        }
    }

    #[test]
    fn find_by_path() {
        assert_eq!(find("/api/integracoes/nibo/sync").map(|r| r.function), Some("nibo-sync"));
        assert!(find("/api/integracoes/desconhecida").is_none());
    }
}
