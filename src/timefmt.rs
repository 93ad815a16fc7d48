// ==========================================
// 仓储装载跟踪系统 - 时长格式化
// ==========================================
// 职责: 毫秒时长转 "Xh Ym Zs" 人类可读文本
// ==========================================

/// 毫秒时长格式化
///
/// 规则:
/// 1. 负值与 NaN 按 0 处理
/// 2. 小时/分钟仅在非零时输出
/// 3. show_seconds 为真时输出秒,全零时输出 "0s"
/// 4. show_seconds 为假且不足一分钟时输出 "<1m"
pub fn format_duration_ms(ms: f64, show_seconds: bool) -> String {
    let ms = if ms.is_nan() || ms < 0.0 { 0.0 } else { ms };
    let total_seconds = (ms / 1000.0).floor() as u64;
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let hours = total_minutes / 60;

    let mut parts: Vec<String> = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if show_seconds && (seconds > 0 || (hours == 0 && minutes == 0 && parts.is_empty())) {
        parts.push(format!("{}s", seconds));
    }

    if parts.is_empty() {
        return "<1m".to_string();
    }
    parts.join(" ")
}
