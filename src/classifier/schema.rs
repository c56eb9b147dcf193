//! 内置属性表：LLM 需要从工单文本中抽取的设备属性

use std::collections::BTreeMap;

pub const ATTR_EQUIPMENT_TYPE: &str = "equipment_type";
pub const ATTR_FAILURE_POINT: &str = "failure_point";
pub const ATTR_SERIAL: &str = "serial_number";

/// 序列号缺失时的占位值
pub const SERIAL_EMPTY_PLACEHOLDER: &str = "Уточнить";

/// 单个属性的描述
#[derive(Debug, Clone)]
pub struct SchemaAttribute {
    pub name: &'static str,
    pub title: &'static str,
    pub examples: &'static [&'static str],
    /// true 时 examples 为全部可选值，否则仅为示例
    pub is_enum: bool,
    /// 把与拉丁字母同形的西里尔字母替换为拉丁字母
    pub convert_latin: bool,
    pub upper_case: bool,
    pub hint: Option<&'static str>,
    pub empty_placeholder: Option<&'static str>,
}

pub static SCHEMA_ATTRIBUTES: &[SchemaAttribute] = &[
    SchemaAttribute {
        name: ATTR_EQUIPMENT_TYPE,
        title: "Тип оборудования",
        examples: &["Ноутбук", "Сервер", "Коммутатор", "Точка доступа", "Контролллер"],
        is_enum: true,
        convert_latin: false,
        upper_case: false,
        hint: None,
        empty_placeholder: None,
    },
    SchemaAttribute {
        name: ATTR_FAILURE_POINT,
        title: "Точка отказа",
        examples: &[
            "Jack",
            "SFP модуль",
            "Wi-fi антенна",
            "Wi-fi модуль",
            "Аккумулятор",
            "Блок питания",
            "Вентилятор",
            "Динамики",
            "Диск",
            "Камера",
            "Клавиатура",
            "Консультация",
            "Корпус",
            "Материнская плата",
            "Матрица",
            "Оперативная память",
            "Программное обеспечение",
            "Сервер",
        ],
        is_enum: true,
        convert_latin: false,
        upper_case: false,
        hint: Some(
            "Try to understand and logically infer one of suggested values. \
             This attribute generally means what part or module was broken in equipment.",
        ),
        empty_placeholder: None,
    },
    SchemaAttribute {
        name: ATTR_SERIAL,
        title: "Серийный номер",
        examples: &["C253140360", "CKM01230505747", "D119990456", "E2440311114"],
        is_enum: false,
        convert_latin: true,
        upper_case: false,
        hint: Some("It must be some kind of serial number of equipment."),
        empty_placeholder: Some(SERIAL_EMPTY_PLACEHOLDER),
    },
];

/// 属性名 -> 显示名
pub fn attribute_labels() -> BTreeMap<String, String> {
    SCHEMA_ATTRIBUTES
        .iter()
        .map(|a| (a.name.to_string(), a.title.to_string()))
        .collect()
}

/// 西里尔同形字母转拉丁（序列号常被混写）
pub fn translit(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'С' => 'C',
            'Е' => 'E',
            'В' => 'B',
            'А' => 'A',
            'Н' => 'H',
            'К' => 'K',
            'М' => 'M',
            'О' => 'O',
            'Р' => 'P',
            'Т' => 'T',
            'Х' => 'X',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translit_replaces_lookalikes_only() {
        assert_eq!(translit("СКМ01230505747"), "CKM01230505747");
        assert_eq!(translit("Серийный"), "Cерийный");
        assert_eq!(translit("abc-123"), "abc-123");
    }

    #[test]
    fn test_labels_cover_every_attribute() {
        let labels = attribute_labels();
        assert_eq!(labels.len(), SCHEMA_ATTRIBUTES.len());
        assert_eq!(labels[ATTR_SERIAL], "Серийный номер");
        assert_eq!(labels[ATTR_FAILURE_POINT], "Точка отказа");
    }
}
