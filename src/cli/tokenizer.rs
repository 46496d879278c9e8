use crate::errors::GatewayError;

/// 把一条自由格式的参数字符串切分为有序 token 序列。
///
/// 解析交给 shlex（POSIX 引号规则）：未加引号的空白是分隔符；成对的
/// 单引号或双引号之间的内容（包括内部空白）作为一个 token 保留，引号
/// 本身被剥除；反斜杠转义按 shell 规则解释。不做任何其他 shell 语义
/// 解释——没有通配符展开、变量替换或命令替换，这是注入防护的安全边界
/// 而不是 shell 仿真。
///
/// 未闭合的引号（以及悬挂的转义符）返回 `GatewayError::Tokenize`，
/// 不会被静默丢弃。
pub fn tokenize(input: &str) -> Result<Vec<String>, GatewayError> {
    shlex::split(input).ok_or_else(|| {
        GatewayError::Tokenize(format!("存在未闭合的引号或转义: {}", input))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_whitespace_split() {
        let tokens = tokenize("issues get PROJ-123 --output json").unwrap();
        assert_eq!(
            tokens,
            vec!["issues", "get", "PROJ-123", "--output", "json"]
        );
    }

    #[test]
    fn test_double_quoted_span_is_one_token() {
        let tokens =
            tokenize(r#"issues create --project PROJ --summary "Fix login bug""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                "issues",
                "create",
                "--project",
                "PROJ",
                "--summary",
                "Fix login bug"
            ]
        );
    }

    #[test]
    fn test_multiple_quoted_values_recoverable_by_position() {
        let tokens =
            tokenize(r#"--summary "Fix bug" --description "Users cannot log in""#).unwrap();
        let summary_pos = tokens.iter().position(|t| t == "--summary").unwrap();
        let desc_pos = tokens.iter().position(|t| t == "--description").unwrap();
        assert_eq!(tokens[summary_pos + 1], "Fix bug");
        assert_eq!(tokens[desc_pos + 1], "Users cannot log in");
    }

    #[test]
    fn test_single_quotes_behave_like_double() {
        let tokens = tokenize("logs query --nrql 'SELECT * FROM Log'").unwrap();
        assert_eq!(tokens, vec!["logs", "query", "--nrql", "SELECT * FROM Log"]);
    }

    #[test]
    fn test_unmatched_quote_is_an_error() {
        let err = tokenize(r#"search "unterminated"#).unwrap_err();
        assert_eq!(err.error_code(), "TOKENIZE_ERROR");
        // 悬挂的转义符同样拒绝
        assert!(tokenize(r"oops\").is_err());
    }

    #[test]
    fn test_backslash_escaped_space_joins_token() {
        assert_eq!(tokenize(r"a\ b").unwrap(), vec!["a b"]);
    }

    #[test]
    fn test_backslash_escaped_quotes_stay_literal() {
        let tokens = tokenize(r#"say \"hi\" now"#).unwrap();
        assert_eq!(tokens, vec!["say", "\"hi\"", "now"]);
    }

    #[test]
    fn test_empty_quotes_yield_empty_token() {
        let tokens = tokenize(r#"--summary """#).unwrap();
        assert_eq!(tokens, vec!["--summary", ""]);
    }

    #[test]
    fn test_adjacent_quoted_and_bare_text_merge() {
        // shell 语义：引号紧贴裸文本时属于同一个 token
        let tokens = tokenize(r#"--name=pre"fix ed"post"#).unwrap();
        assert_eq!(tokens, vec!["--name=prefix edpost"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_no_glob_or_variable_expansion() {
        let tokens = tokenize("drive list * $HOME `id`").unwrap();
        assert_eq!(tokens, vec!["drive", "list", "*", "$HOME", "`id`"]);
    }
}
