/// Requisição do protocolo de linha: primeiro token é o comando
/// (case-insensitive), os demais são argumentos. Payloads binários e
/// whitespace embutido não são suportados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub args: Vec<String>,
}

impl Request {
    /// Faz o parse de uma linha em Request. Retorna None para linha em branco.
    pub fn parse(line: &str) -> Option<Request> {
        let mut fields = line.split_whitespace();
        let command = fields.next()?.to_string();
        let args = fields.map(str::to_string).collect();

        Some(Request { command, args })
    }

    /// Chave de roteamento do proxy: o segundo token da linha,
    /// independente do comando.
    pub fn routing_key(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Reencoda a requisição como uma linha (sem o `\n` final).
    pub fn to_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let req = Request::parse("SET key value").unwrap();
        assert_eq!(req.command, "SET");
        assert_eq!(req.args, vec!["key", "value"]);
    }

    #[test]
    fn parse_blank_line() {
        assert_eq!(Request::parse(""), None);
        assert_eq!(Request::parse("   \t "), None);
    }

    #[test]
    fn parse_collapses_whitespace() {
        let req = Request::parse("  GET \t mykey ").unwrap();
        assert_eq!(req.command, "GET");
        assert_eq!(req.args, vec!["mykey"]);
    }

    #[test]
    fn parse_command_only() {
        let req = Request::parse("KEYS").unwrap();
        assert_eq!(req.command, "KEYS");
        assert!(req.args.is_empty());
    }

    #[test]
    fn routing_key_is_second_token() {
        let req = Request::parse("LSET mylist 0 value").unwrap();
        assert_eq!(req.routing_key(), Some("mylist"));

        let req = Request::parse("SIZE").unwrap();
        assert_eq!(req.routing_key(), None);
    }

    #[test]
    fn to_line_roundtrip() {
        let req = Request::parse("HSET hash field value").unwrap();
        assert_eq!(req.to_line(), "HSET hash field value");
        assert_eq!(Request::parse(&req.to_line()).unwrap(), req);

        let req = Request::parse("SIZE").unwrap();
        assert_eq!(req.to_line(), "SIZE");
    }
}
