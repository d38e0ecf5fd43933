//! 配置校验模块
//!
//! 校验规则：
//! - output_step_name 非空
//! - mime_overrides 的扩展名非空且不带前导 '.'
//! - mime_overrides 的值形如 type/subtype

use contracts::{ContractError, DispatcherConfig};

/// 校验 DispatcherConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DispatcherConfig) -> Result<(), ContractError> {
    validate_output_step(config)?;
    validate_mime_overrides(config)?;
    Ok(())
}

/// 校验输出步骤名称
fn validate_output_step(config: &DispatcherConfig) -> Result<(), ContractError> {
    if config.output_step_name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "output_step_name",
            "output step name cannot be empty",
        ));
    }
    Ok(())
}

/// 校验 MIME 覆盖表
fn validate_mime_overrides(config: &DispatcherConfig) -> Result<(), ContractError> {
    // 按扩展名排序，保证错误信息稳定
    let mut entries: Vec<_> = config.mime_overrides.iter().collect();
    entries.sort();

    for (ext, mime) in entries {
        if ext.trim().is_empty() {
            return Err(ContractError::config_validation(
                "mime_overrides",
                "extension cannot be empty",
            ));
        }
        if ext.starts_with('.') {
            return Err(ContractError::config_validation(
                format!("mime_overrides[{ext}]"),
                "extension must not start with '.'",
            ));
        }
        if !is_mime_type(mime) {
            return Err(ContractError::config_validation(
                format!("mime_overrides[{ext}]"),
                format!("'{mime}' is not a type/subtype MIME type"),
            ));
        }
    }
    Ok(())
}

fn is_mime_type(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !subtype.contains('/')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
