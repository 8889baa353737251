use std::str::FromStr;

use chrono::Weekday;
use chrono_tz::Tz;
use shared::models::{ServiceCategory, ServiceDefinition};

/// 服务器配置 - 预约后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/clearview | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | BUSINESS_TIMEZONE | America/Denver | 业务时区 |
/// | BUSINESS_NAME | ClearView Auto Glass | 商户名称 |
/// | BUSINESS_PHONE | (385) 555-0147 | 商户电话 (短信模板用) |
/// | FRONTEND_URL | http://localhost:3000 | 前端地址 (支付回跳) |
/// | TWILIO_ACCOUNT_SID | - | 短信服务凭证 (缺省则短信降级为日志) |
/// | TWILIO_AUTH_TOKEN | - | 短信服务凭证 |
/// | TWILIO_PHONE_NUMBER | - | 短信发送号码 |
/// | BUSINESS_NOTIFY_PHONE | - | 员工通知号码 |
/// | EMAIL_API_URL | - | 邮件服务地址 (缺省则邮件降级为日志) |
/// | EMAIL_API_KEY | - | 邮件服务密钥 |
/// | EMAIL_FROM | bookings@clearviewautoglass.com | 发件人 |
/// | PAYPAL_CLIENT_ID | - | 支付网关凭证 |
/// | PAYPAL_CLIENT_SECRET | - | 支付网关凭证 |
/// | PAYPAL_MODE | sandbox | sandbox \| live |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/clearview HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区 (所有日程计算的基准)
    pub business_timezone: Tz,
    /// 商户信息 (通知模板)
    pub business: BusinessInfo,
    /// 前端地址 (支付成功/取消回跳)
    pub frontend_url: String,
    /// 营业时间与时段几何
    pub schedule: ScheduleConfig,
    /// 服务目录
    pub catalog: ServiceCatalog,
    /// 短信服务配置
    pub sms: SmsProviderConfig,
    /// 邮件服务配置
    pub email: EmailProviderConfig,
    /// 支付网关配置
    pub paypal: PayPalConfig,
}

/// 商户身份信息 (出现在短信/邮件文案中)
#[derive(Debug, Clone)]
pub struct BusinessInfo {
    pub name: String,
    pub phone: String,
    pub website: String,
}

/// 短信服务凭证 - 任一缺失则客户端进入降级模式
#[derive(Debug, Clone, Default)]
pub struct SmsProviderConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_phone: Option<String>,
    /// 员工通知号码 (取消/改期提醒)
    pub notify_phone: Option<String>,
}

/// 邮件服务凭证 - 任一缺失则客户端进入降级模式
#[derive(Debug, Clone, Default)]
pub struct EmailProviderConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: String,
}

/// 支付网关凭证
#[derive(Debug, Clone, Default)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// sandbox | live
    pub mode: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/clearview".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            business_timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|tz| Tz::from_str(&tz).ok())
                .unwrap_or(chrono_tz::America::Denver),
            business: BusinessInfo {
                name: std::env::var("BUSINESS_NAME")
                    .unwrap_or_else(|_| "ClearView Auto Glass".into()),
                phone: std::env::var("BUSINESS_PHONE").unwrap_or_else(|_| "(385) 555-0147".into()),
                website: std::env::var("BUSINESS_WEBSITE")
                    .unwrap_or_else(|_| "clearviewautoglass.com".into()),
            },
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            schedule: ScheduleConfig::default(),
            catalog: ServiceCatalog::default(),
            sms: SmsProviderConfig {
                account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok(),
                auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok(),
                from_phone: std::env::var("TWILIO_PHONE_NUMBER").ok(),
                notify_phone: std::env::var("BUSINESS_NOTIFY_PHONE").ok(),
            },
            email: EmailProviderConfig {
                api_url: std::env::var("EMAIL_API_URL").ok(),
                api_key: std::env::var("EMAIL_API_KEY").ok(),
                from_address: std::env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "bookings@clearviewautoglass.com".into()),
            },
            paypal: PayPalConfig {
                client_id: std::env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
                client_secret: std::env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
                mode: std::env::var("PAYPAL_MODE").unwrap_or_else(|_| "sandbox".into()),
            },
        }
    }

    /// 数据库目录: {work_dir}/database
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("database")
    }

    /// 日志目录: {work_dir}/logs
    pub fn log_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// Opening hours for one weekday
#[derive(Debug, Clone)]
pub struct DayHours {
    /// Opening time, HH:MM
    pub open: String,
    /// Closing time, HH:MM (exclusive slot bound)
    pub close: String,
    pub is_open: bool,
}

impl DayHours {
    pub fn open_day(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
            is_open: true,
        }
    }

    pub fn closed() -> Self {
        Self {
            open: "00:00".to_string(),
            close: "00:00".to_string(),
            is_open: false,
        }
    }
}

/// 营业时间与时段几何配置
///
/// 运行期只读；按周几查表。`buffer_minutes` 为预留字段，当前不参与
/// 时段生成。
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,

    /// Slot length in minutes
    pub slot_duration_minutes: u32,
    /// Reserved gap between slots; not currently applied
    pub buffer_minutes: u32,
    /// Maximum concurrent bookings per slot (>= 1)
    pub max_bookings_per_slot: u32,
    /// How far into the future bookings are offered
    pub advance_booking_days: u32,
    /// Minimum notice for same-day bookings
    pub min_notice_hours: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            monday: DayHours::open_day("08:00", "18:00"),
            tuesday: DayHours::open_day("08:00", "18:00"),
            wednesday: DayHours::open_day("08:00", "18:00"),
            thursday: DayHours::open_day("08:00", "18:00"),
            friday: DayHours::open_day("08:00", "18:00"),
            saturday: DayHours::open_day("09:00", "16:00"),
            sunday: DayHours::closed(),
            slot_duration_minutes: 30,
            buffer_minutes: 15,
            max_bookings_per_slot: 2,
            advance_booking_days: 30,
            min_notice_hours: 2,
        }
    }
}

impl ScheduleConfig {
    /// 按周几查营业时间
    pub fn hours_for(&self, weekday: Weekday) -> &DayHours {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// 校验配置不变量: 营业日必须 open < close，容量至少为 1
    pub fn validate(&self) -> Result<(), String> {
        if self.max_bookings_per_slot < 1 {
            return Err("max_bookings_per_slot must be >= 1".into());
        }
        if self.slot_duration_minutes == 0 {
            return Err("slot_duration_minutes must be > 0".into());
        }
        for day in [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ] {
            if day.is_open && day.open >= day.close {
                return Err(format!(
                    "open time {} must be before close time {}",
                    day.open, day.close
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Service Catalog
// =============================================================================

/// 服务目录 - 启动时装配，运行期只读
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<ServiceDefinition>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceDefinition>) -> Self {
        Self { services }
    }

    pub fn all(&self) -> &[ServiceDefinition] {
        &self.services
    }

    pub fn find(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        let svc = |id: &str,
                   name: &str,
                   description: &str,
                   short: &str,
                   price: f64,
                   minutes: u32,
                   category: ServiceCategory,
                   features: &[&str],
                   popular: bool| ServiceDefinition {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            short_description: short.to_string(),
            base_price: price,
            estimated_duration: minutes,
            category,
            features: features.iter().map(|f| f.to_string()).collect(),
            popular,
        };

        Self::new(vec![
            svc(
                "windshield",
                "Windshield Replacement",
                "Complete windshield replacement with high-quality glass and professional installation.",
                "Full windshield replacement",
                199.99,
                90,
                ServiceCategory::Replacement,
                &[
                    "OEM and aftermarket glass options",
                    "Same-day service available",
                    "Lifetime warranty on installation",
                    "Insurance claims assistance",
                ],
                true,
            ),
            svc(
                "repair",
                "Auto Glass Repair",
                "Expert repair services for chips and cracks to restore your windshield integrity.",
                "Chip and crack repair",
                49.99,
                30,
                ServiceCategory::Repair,
                &[
                    "Quick 30-minute repairs",
                    "Prevents crack spreading",
                    "Maintains original factory seal",
                    "Most insurance covers 100%",
                ],
                true,
            ),
            svc(
                "side-window",
                "Side Window Replacement",
                "Professional replacement of side door windows and vent glass.",
                "Side window replacement",
                149.99,
                60,
                ServiceCategory::Replacement,
                &[
                    "All makes and models",
                    "Factory-quality glass",
                    "Proper sealing and installation",
                    "Mobile service available",
                ],
                false,
            ),
            svc(
                "back-glass",
                "Back Glass Replacement",
                "Complete rear windshield replacement with defrost line integration.",
                "Rear windshield replacement",
                249.99,
                120,
                ServiceCategory::Replacement,
                &[
                    "Heated rear glass available",
                    "Antenna and defrost reconnection",
                    "Perfect fit guarantee",
                    "Competitive pricing",
                ],
                false,
            ),
            svc(
                "mirror",
                "Mirror Replacement",
                "Side mirror and rearview mirror replacement and repair services.",
                "Mirror replacement & repair",
                79.99,
                45,
                ServiceCategory::Replacement,
                &[
                    "Heated mirror options",
                    "Power mirror installation",
                    "Glass and housing replacement",
                    "Color-matched housings",
                ],
                false,
            ),
            svc(
                "auto-repair",
                "General Auto Repair",
                "Comprehensive auto repair services to keep your vehicle running smoothly.",
                "General maintenance & repair",
                99.99,
                120,
                ServiceCategory::Repair,
                &[
                    "Diagnostic services",
                    "Maintenance and tune-ups",
                    "Brake services",
                    "Engine repair",
                ],
                false,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_valid() {
        assert!(ScheduleConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_hours_rejected() {
        let mut schedule = ScheduleConfig::default();
        schedule.monday = DayHours::open_day("18:00", "08:00");
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn catalog_lookup() {
        let catalog = ServiceCatalog::default();
        assert_eq!(catalog.find("repair").unwrap().base_price, 49.99);
        assert!(catalog.find("nope").is_none());
        assert_eq!(catalog.all().len(), 6);
    }
}
