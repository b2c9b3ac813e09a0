//! 场景脚本解析器
//!
//! 把文本生成服务返回的场景脚本解析为有序场景列表。
//! 模型被要求按 "Scene N:" 逐行编号输出，但实际回复格式并不稳定，
//! 这里统一剥离行首的列表标记与编号，只保留场景描述本身。

/// 检查字符是否为行首列表标记（破折号、星号等）
#[inline]
fn is_list_marker(ch: char) -> bool {
    matches!(ch, '-' | '*' | '•')
}

/// 剥离 "Scene N:" / "Scene N." 前缀（大小写不敏感）
fn strip_scene_label(s: &str) -> &str {
    const LABEL: &str = "scene";
    match s.get(..LABEL.len()) {
        Some(head) if head.eq_ignore_ascii_case(LABEL) => {}
        _ => return s,
    }

    let rest = s[LABEL.len()..].trim_start();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }

    let after = rest[digits..].trim_start();
    match after.strip_prefix(':').or_else(|| after.strip_prefix('.')) {
        Some(stripped) => stripped.trim_start(),
        None => s,
    }
}

/// 剥离裸编号前缀（"1." / "1)" / "1:"）
fn strip_ordinal(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }

    let after = &s[digits..];
    match after
        .strip_prefix('.')
        .or_else(|| after.strip_prefix(')'))
        .or_else(|| after.strip_prefix(':'))
    {
        Some(stripped) => stripped.trim_start(),
        None => s,
    }
}

/// 清洗单行，返回场景描述；空行与纯标记行返回 None
fn clean_scene_line(line: &str) -> Option<String> {
    let mut s = line.trim();
    while let Some(rest) = s.strip_prefix(is_list_marker) {
        s = rest.trim_start();
    }
    s = strip_scene_label(s);
    s = strip_ordinal(s);

    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// 解析场景脚本
///
/// 按行拆分，剥离行首列表标记与编号，丢弃空行。
/// 顺序与回复中的行序一致。
///
/// 零可用行返回空列表，表示"未识别出场景"，由调用方决定终止，
/// 这里不将其视为错误。
pub fn parse_scene_script(reply: &str) -> Vec<String> {
    reply.lines().filter_map(clean_scene_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_scene_lines() {
        let reply = "Scene 1: I was flying over a city.\nScene 2: then I landed in a forest.";
        let scenes = parse_scene_script(reply);

        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0], "I was flying over a city.");
        assert_eq!(scenes[1], "then I landed in a forest.");
    }

    #[test]
    fn test_order_preserved() {
        let reply = "Scene 1: first\nScene 2: second\nScene 3: third";
        let scenes = parse_scene_script(reply);
        assert_eq!(scenes, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_reply_yields_empty_list() {
        assert!(parse_scene_script("").is_empty());
        assert!(parse_scene_script("\n\n  \n").is_empty());
    }

    #[test]
    fn test_blank_lines_discarded() {
        let reply = "Scene 1: a dark corridor\n\n\nScene 2: a bright door";
        let scenes = parse_scene_script(reply);
        assert_eq!(scenes.len(), 2);
    }

    #[test]
    fn test_dash_list_markers_stripped() {
        let reply = "- Scene 1: a red balloon\n- Scene 2: a grey sky";
        let scenes = parse_scene_script(reply);
        assert_eq!(scenes, vec!["a red balloon", "a grey sky"]);
    }

    #[test]
    fn test_bare_ordinals_stripped() {
        let reply = "1. walking on water\n2) sinking slowly\n3: floating again";
        let scenes = parse_scene_script(reply);
        assert_eq!(scenes, vec!["walking on water", "sinking slowly", "floating again"]);
    }

    #[test]
    fn test_unlabelled_lines_kept_as_is() {
        let reply = "a house made of glass\nrain falling upward";
        let scenes = parse_scene_script(reply);
        assert_eq!(scenes, vec!["a house made of glass", "rain falling upward"]);
    }

    #[test]
    fn test_scene_label_case_insensitive() {
        let scenes = parse_scene_script("SCENE 1: shouting\nscene 2: whispering");
        assert_eq!(scenes, vec!["shouting", "whispering"]);
    }

    #[test]
    fn test_scene_word_without_number_not_stripped() {
        // "Scene" 开头但没有编号的行是正常描述，不能误剥离
        let scenes = parse_scene_script("Scene of a quiet lake at dawn");
        assert_eq!(scenes, vec!["Scene of a quiet lake at dawn"]);
    }

    #[test]
    fn test_marker_only_line_discarded() {
        let scenes = parse_scene_script("- \nScene 1: something real");
        assert_eq!(scenes, vec!["something real"]);
    }

    #[test]
    fn test_windows_line_endings() {
        let scenes = parse_scene_script("Scene 1: one\r\nScene 2: two\r\n");
        assert_eq!(scenes, vec!["one", "two"]);
    }
}
