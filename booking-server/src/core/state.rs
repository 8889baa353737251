use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::bookings::BookingService;
use crate::bookings::housekeeping::HousekeepingWorker;
use crate::core::Config;
use crate::core::tasks::BackgroundTasks;
use crate::db::DbService;
use crate::db::repository::{BlockedSlotRepository, BookingRepository, ContactRepository};
use crate::scheduling::{Clock, SchedulingService, SystemClock};
use crate::services::{EmailClient, Notifier, PaymentClient, SmsClient};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是后端的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc/浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | scheduling | SchedulingService | 时段生成与可用性解析 |
/// | bookings | BookingService | 预约台账 |
/// | blocked_slots | BlockedSlotRepository | 封锁时段注册表 |
/// | contacts | ContactRepository | 联系表单 |
/// | notifier | Notifier | 邮件/短信通知门面 |
/// | payments | PaymentClient | 支付网关 |
/// | clock | Arc<dyn Clock> | 时间源 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub scheduling: SchedulingService,
    pub bookings: BookingService,
    pub blocked_slots: BlockedSlotRepository,
    pub contacts: ContactRepository,
    pub notifier: Notifier,
    pub payments: PaymentClient,
    pub clock: Arc<dyn Clock>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/clearview.db)
    /// 3. 各服务 (调度、台账、通知、支付)
    ///
    /// # Panics
    ///
    /// 配置不变量或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .schedule
            .validate()
            .expect("Invalid schedule configuration");
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("clearview.db");
        let db_service = DbService::new(&db_path)
            .await
            .expect("Failed to initialize database");

        Self::with_db(config.clone(), db_service.db, Arc::new(SystemClock))
    }

    /// 从既有数据库句柄和时钟装配状态 (集成测试注入固定时钟)
    pub fn with_db(config: Config, db: Surreal<Db>, clock: Arc<dyn Clock>) -> Self {
        let booking_repo = BookingRepository::new(db.clone());
        let blocked_slots = BlockedSlotRepository::new(db.clone());
        let contacts = ContactRepository::new(db.clone());

        let notifier = Notifier::new(
            EmailClient::new(config.email.clone(), config.business.clone()),
            SmsClient::new(config.sms.clone(), config.business.clone()),
        );
        let payments = PaymentClient::new(config.paypal.clone(), config.business.name.clone());

        let scheduling = SchedulingService::new(
            config.schedule.clone(),
            config.business_timezone,
            clock.clone(),
            booking_repo.clone(),
            blocked_slots.clone(),
        );

        let bookings = BookingService::new(
            booking_repo,
            scheduling.clone(),
            config.catalog.clone(),
            notifier.clone(),
            clock.clone(),
            config.business_timezone,
        );

        Self {
            config,
            db,
            scheduling,
            bookings,
            blocked_slots,
            contacts,
            notifier,
            payments,
            clock,
        }
    }

    /// 启动后台任务 (清扫)。必须在 `Server::run()` 前调用。
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        HousekeepingWorker::new(self.bookings.clone()).spawn_all(&mut tasks);
        tasks.log_summary();
        tasks
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
