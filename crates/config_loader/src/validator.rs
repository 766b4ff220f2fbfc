//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (validator derive)：应用名非空、图表尺寸与压缩缓冲区 > 0、采集间隔 > 0
//! - resource_root 以 `/` 开头并以 `/` 结尾
//! - server.path 以 `/` 开头

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

use contracts::{ContractError, MonitoringConfig};

/// 校验 MonitoringConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &MonitoringConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_resource_root(config)?;
    validate_server_path(config)?;
    Ok(())
}

/// 校验 derive 声明的字段规则
fn validate_fields(config: &MonitoringConfig) -> Result<(), ContractError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };
    let (field, message) = first_violation(&errors, "")
        .unwrap_or_else(|| ("config".to_string(), errors.to_string()));
    Err(ContractError::config_validation(field, message))
}

/// 按字段名排序后的第一个错误 (嵌套路径以 `.` 连接)
fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), |m| m.to_string());
                (path, message)
            }),
            ValidationErrorsKind::Struct(inner) => first_violation(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_violation(inner, &format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 校验资源根路径
fn validate_resource_root(config: &MonitoringConfig) -> Result<(), ContractError> {
    let root = &config.dispatcher.resource_root;
    if !root.starts_with('/') || !root.ends_with('/') {
        return Err(ContractError::config_validation(
            "dispatcher.resource_root",
            format!("resource_root must start and end with '/', got '{root}'"),
        ));
    }
    Ok(())
}

/// 校验 HTTP 路径
fn validate_server_path(config: &MonitoringConfig) -> Result<(), ContractError> {
    let path = &config.server.path;
    if !path.starts_with('/') {
        return Err(ContractError::config_validation(
            "server.path",
            format!("path must start with '/', got '{path}'"),
        ));
    }
    Ok(())
}
