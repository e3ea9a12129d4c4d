//! Static estimate question catalog.
//!
//! The catalog is an ordered list of sections, each holding questions with
//! mutually exclusive priced options. Prices are integers in yen. The data
//! mirrors the published estimate form of the installation service; options
//! are immutable once defined, and quotes snapshot labels and prices at
//! capture time so later catalog edits never change a historical quote.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Pricing constants
// ---------------------------------------------------------------------------

/// Base installation fee (tax included) applied to every quote.
pub const BASE_INSTALLATION_PRICE: i64 = 19_000;

/// Pre-discount list price shown next to the base fee.
pub const ORIGINAL_PRICE: i64 = 22_000;

// ---------------------------------------------------------------------------
// Catalog types
// ---------------------------------------------------------------------------

/// A selectable option with its price delta in yen (tax included).
#[derive(Debug, Clone, Serialize)]
pub struct QuestionOption {
    pub label: String,
    pub price: i64,
}

/// Help copy shown next to a question: why we ask, and how to answer.
#[derive(Debug, Clone, Serialize)]
pub struct HelpText {
    pub reason: String,
    pub guide: String,
}

/// A single catalog question with its ordered, mutually exclusive options.
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    /// Stable identifier, unique across the whole catalog.
    pub id: String,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
    pub help: HelpText,
}

/// An ordered group of questions.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// The full, statically ordered question catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub sections: Vec<Section>,
}

impl Catalog {
    /// Look up a question by its identifier across all sections.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .find(|q| q.id == id)
    }

    /// Look up an option by question identifier and option index.
    pub fn option(&self, question_id: &str, index: usize) -> Option<&QuestionOption> {
        self.question(question_id).and_then(|q| q.options.get(index))
    }

    /// Identifiers of the trailing common question block, in catalog order.
    pub fn common_question_ids(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.id == COMMON_SECTION_ID)
            .flat_map(|s| s.questions.iter())
            .map(|q| q.id.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Plan / model mapping
// ---------------------------------------------------------------------------

/// Identifier of the plan selection question (always the first step).
pub const PLAN_QUESTION_ID: &str = "plan-selection";

/// Identifier of the trailing common section.
pub const COMMON_SECTION_ID: &str = "common";

/// An aircon model sold as a set plan, with the plan option index that
/// selects it and the size question shown when it is chosen.
#[derive(Debug, Clone, Copy)]
pub struct AirconModel {
    pub id: &'static str,
    pub name: &'static str,
    /// Index into the plan question's options.
    pub plan_option: usize,
    pub size_question_id: &'static str,
}

/// Models offered as set plans. Plan option 0 ("installation only") has no
/// model and therefore no size question.
pub const AIRCON_MODELS: [AirconModel; 3] = [
    AirconModel {
        id: "sharp-ac22tfc",
        name: "シャープ AC-22TFC",
        plan_option: 1,
        size_question_id: "model-size-sharp-ac22tfc",
    },
    AirconModel {
        id: "panasonic-cs225dfl",
        name: "パナソニック CS-225DFL",
        plan_option: 2,
        size_question_id: "model-size-panasonic-cs225dfl",
    },
    AirconModel {
        id: "panasonic-cs225dex",
        name: "パナソニック CS-225DEX",
        plan_option: 3,
        size_question_id: "model-size-panasonic-cs225dex",
    },
];

/// The size question to insert for a given plan option, if any.
pub fn size_question_for_plan(plan_option: usize) -> Option<&'static str> {
    AIRCON_MODELS
        .iter()
        .find(|m| m.plan_option == plan_option)
        .map(|m| m.size_question_id)
}

// ---------------------------------------------------------------------------
// Standard catalog data
// ---------------------------------------------------------------------------

fn option(label: &str, price: i64) -> QuestionOption {
    QuestionOption {
        label: label.to_string(),
        price,
    }
}

fn question(id: &str, prompt: &str, options: Vec<QuestionOption>, reason: &str, guide: &str) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        options,
        help: HelpText {
            reason: reason.to_string(),
            guide: guide.to_string(),
        },
    }
}

/// Price of every model/size option (all sizes currently share one price).
const MODEL_SIZE_PRICE: i64 = 199_999;

fn size_question(model: &AirconModel) -> Question {
    let options = ["6畳用", "8畳用", "10畳用", "12畳用"]
        .iter()
        .map(|size| option(&format!("{size} ¥199,999（税込）"), MODEL_SIZE_PRICE))
        .collect();
    question(
        model.size_question_id,
        &format!("{}の畳数・金額を選択してください", model.name),
        options,
        "お部屋の広さに合わせて最適な機種をお選びいただくため、畳数を確認させていただきます。",
        "お部屋の広さに応じて、最適な機種をお選びください。",
    )
}

/// Build the standard estimate catalog.
///
/// Section order is fixed: plan selection, model/size questions (at most one
/// of which appears in a traversal), then the common installation-condition
/// block.
pub fn standard_catalog() -> Catalog {
    let plan = Section {
        id: "plan".to_string(),
        title: "プラン選択".to_string(),
        questions: vec![question(
            PLAN_QUESTION_ID,
            "ご希望のプランをお選びください",
            vec![
                option("取付工事のみ（本体はお持ちの方）", 0),
                option("シャープ AC-22TFC＋取付工事セット", 0),
                option("パナソニック CS-225DFL＋取付工事セット", 0),
                option("パナソニック CS-225DEX＋取付工事セット", 0),
            ],
            "お客様のご要望に最適なプランをご提案するため、まずは基本プランをお選びください。",
            "本体をお持ちの方は「取付工事のみ」を、本体も含めてご希望の方は各メーカーのセットプランをお選びください。",
        )],
    };

    let model_size = Section {
        id: "model-size".to_string(),
        title: "機種・畳数選択".to_string(),
        questions: AIRCON_MODELS.iter().map(size_question).collect(),
    };

    let common = Section {
        id: COMMON_SECTION_ID.to_string(),
        title: "設置条件".to_string(),
        questions: vec![
            question(
                "housing-type",
                "住居タイプを教えてください",
                vec![
                    option("賃貸アパート", 0),
                    option("賃貸マンション", 0),
                    option("持ち家 戸建て", 0),
                    option("持ち家 マンション", 0),
                ],
                "住居タイプによって工事方法や追加料金が異なる場合があります。",
                "お住まいの形態をお選びください。",
            ),
            question(
                "outdoor-unit-location",
                "室外機の設置場所はどちらですか？",
                vec![
                    option("同じ階・ベランダなど", 0),
                    option("1階に降ろす", 11_000),
                    option("屋根の上に置く", 15_400),
                    option("壁に金具で固定", 16_500),
                ],
                "室外機の設置場所によって工事方法や追加料金が異なります。",
                "室外機を設置する予定の場所をお選びください。",
            ),
            question(
                "removal-needed",
                "エアコンの取り外しは必要ですか？",
                vec![option("必要（回収・処分込み）", 5_500), option("不要", 0)],
                "既存のエアコンを取り外す必要がある場合、追加料金が発生します。",
                "既存のエアコンがある場合は「必要」を選択してください。",
            ),
            question(
                "pipe-length",
                "室内機から室外機までの配管の長さはどれくらいですか？",
                vec![
                    option("4m以内", 0),
                    option("4～8m", 13_200),
                    option("それ以上（要相談）", 0),
                    option("わからない", 0),
                ],
                "配管の長さによって追加料金が発生する場合があります。",
                "配管の長さがわからない場合は「わからない」を選択してください。",
            ),
            question(
                "indoor-pipe-cover",
                "室内側の配管カバーは必要ですか？",
                vec![
                    option("賃貸の方はこちらを選択", 0),
                    option("1mまで", 10_800),
                    option("2mまで", 16_800),
                    option("必要ない", 0),
                ],
                "配管カバーの長さによって追加料金が異なります。",
                "賃貸の方は「賃貸の方はこちらを選択」を選択してください。",
            ),
            question(
                "outdoor-pipe-cover",
                "室外側の配管カバーは必要ですか？",
                vec![
                    option("賃貸の方はこちらを選択", 0),
                    option("2mまで", 10_800),
                    option("4mまで", 16_800),
                    option("必要ない", 0),
                ],
                "配管カバーの長さによって追加料金が異なります。",
                "賃貸の方は「賃貸の方はこちらを選択」を選択してください。",
            ),
            question(
                "hole-exists",
                "エアコン用の配管穴は空いていますか？",
                vec![
                    option("すでに穴がある", 0),
                    option("穴が開いていない", 5_500),
                    option("賃貸の方はこちらを選択", 0),
                    option("わからない", 0),
                ],
                "配管穴の有無によって工事内容や追加料金が異なります。",
                "賃貸の方は「賃貸の方はこちらを選択」を選択してください。",
            ),
            question(
                "outlet-exists",
                "設置希望場所の近くにエアコン専用コンセントはありますか？",
                vec![option("ある", 0), option("ない", 0), option("わからない", 0)],
                "コンセントの有無によって工事内容や追加料金が異なる場合があります。",
                "コンセントの有無がわからない場合は「わからない」を選択してください。",
            ),
        ],
    };

    Catalog {
        sections: vec![plan, model_size, common],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
