/*!
 * Prompt templates for the language collaborators.
 *
 * Four calls reach a chat model during a run or a query:
 * - sentence merging (re-segmentation of the raw transcript)
 * - translation into the display language
 * - furigana annotation with ruby markup
 * - on-demand grammar and vocabulary analysis
 *
 * Merge and annotation prompts are fixed; translation and analysis prompts
 * follow the display language.
 */

use crate::language_utils::DisplayLanguage;

/// A system + user prompt pair
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// System role for the sentence merger
pub const MERGE_SYSTEM: &str = "你是日语母语者，擅长根据语义和语法判断句子边界。";

/// Instruction placed before the numbered segment list
const MERGE_INSTRUCTION: &str = "以下是自动语音识别分割的日语句子列表，部分句子被错误拆分。\
请你根据语义和语法，将应该合并的句子合并，输出合并后的完整日语句子列表（每句一行，可以带编号）：";

/// System role for furigana annotation
pub const FURIGANA_SYSTEM: &str = "你是一个日语专家。请将以下日语句子转换为带假名的格式，使用HTML的ruby标签。\
只对汉字添加假名读音，假名部分保持原样。如果遇到不完整的句子片段，请根据上下文理解完整意思后再添加假名。\
确保假名标注的准确性和完整性。例如：<ruby>日本語<rt>にほんご</rt></ruby>を<ruby>勉強<rt>べんきょう</rt></ruby>する。\
只输出转换后的文本。";

/// Learning-system note appended to every translation role
const TRANSLATION_NOTE: &str = "注意：这是一个日语学习系统，请确保翻译的准确性和流畅性。\
如果遇到不完整的句子片段，请根据上下文理解完整意思后再翻译。翻译时要注意保持日语的语言特点和表达方式。";

/// Build the merge prompt from the trimmed segment texts
///
/// Segments are numbered from 1, one per line: `1. text`.
pub fn merge_prompt(segments: &[String]) -> Prompt {
    let numbered = segments
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    Prompt {
        system: MERGE_SYSTEM.to_string(),
        user: format!("{}\n{}", MERGE_INSTRUCTION, numbered),
    }
}

/// Translation role for one display language
pub fn translation_system(language: DisplayLanguage) -> String {
    let role = match language {
        DisplayLanguage::Chinese => "你是日文→中文专业翻译，只输出一句流畅的中文译文。",
        DisplayLanguage::English => {
            "You are a professional Japanese to English translator. Output only a fluent English translation."
        }
        DisplayLanguage::Korean => "당신은 일본어→한국어 전문 번역가입니다. 유창한 한국어 번역만 출력하세요.",
    };
    format!("{} {}", role, TRANSLATION_NOTE)
}

/// Build the translation prompt for one sentence
pub fn translation_prompt(sentence: &str, language: DisplayLanguage) -> Prompt {
    Prompt {
        system: translation_system(language),
        user: sentence.to_string(),
    }
}

/// Build the furigana prompt for one sentence
pub fn furigana_prompt(sentence: &str) -> Prompt {
    Prompt {
        system: FURIGANA_SYSTEM.to_string(),
        user: sentence.to_string(),
    }
}

/// Build the analysis prompt for one sentence
pub fn analysis_prompt(sentence: &str, language: DisplayLanguage) -> Prompt {
    let (system, template) = match language {
        DisplayLanguage::Chinese => (
            "你是一个专业的日语教师，擅长用中文分析日语语法和词汇。请确保分析内容全面、准确、易懂。重点词汇分析必须使用表格形式展示。",
            ANALYSIS_TEMPLATE_ZH,
        ),
        DisplayLanguage::English => (
            "You are a professional Japanese teacher, skilled in analyzing Japanese grammar and vocabulary in English. \
Please ensure the analysis is comprehensive, accurate, and easy to understand. \
Important vocabulary analysis must be presented in table format.",
            ANALYSIS_TEMPLATE_EN,
        ),
        DisplayLanguage::Korean => (
            "당신은 일본어 문법과 어휘를 한국어로 분석하는 전문 일본어 교사입니다. 분석이 포괄적이고 정확하며 이해하기 쉽도록 해주세요. 중요 어휘 분석은 반드시 표 형식으로 제시해야 합니다.",
            ANALYSIS_TEMPLATE_KO,
        ),
    };

    Prompt {
        system: system.to_string(),
        user: template.replace("{sentence}", sentence),
    }
}

const ANALYSIS_TEMPLATE_ZH: &str = r#"请用中文详细分析以下日语句子，必须包含以下所有内容：

1. 重点词汇分析（请用表格形式展示）：
| 词汇 | 假名读音 | 词性 | 中文意思 | 使用场景 |
|------|----------|------|----------|----------|

2. 语法点分析：
   - 语法结构说明
   - 用法解释
   - 2-3个相关例句

3. 句子整体分析：
   - 句子类型（陈述句、疑问句等）
   - 语气和语感
   - 使用场景

句子：{sentence}"#;

const ANALYSIS_TEMPLATE_EN: &str = r#"Please analyze the following Japanese sentence in detail, including ALL of the following:

1. Important Vocabulary Analysis (Please present in table format):
| Vocabulary | Furigana | Part of Speech | English Meaning | Usage Context |
|------------|----------|----------------|-----------------|---------------|

2. Grammar Point Analysis:
   - Grammar structure explanation
   - Usage explanation
   - 2-3 related example sentences

3. Overall Sentence Analysis:
   - Sentence type (declarative, interrogative, etc.)
   - Tone and nuance
   - Usage context

Sentence: {sentence}"#;

const ANALYSIS_TEMPLATE_KO: &str = r#"다음 일본어 문장을 상세히 분석해주세요. 다음 내용을 모두 포함해야 합니다:

1. 중요 어휘 분석 (표 형식으로 제시):
| 어휘 | 후리가나 | 품사 | 한국어 의미 | 사용 맥락 |
|------|----------|------|------------|----------|

2. 문법 포인트 분석:
   - 문법 구조 설명
   - 용법 설명
   - 관련 예문 2-3개

3. 전체 문장 분석:
   - 문장 유형 (평서문, 의문문 등)
   - 어조와 뉘앙스
   - 사용 맥락

문장: {sentence}"#;
