use super::types::IntentType;

/// Phrases that always mean "run a full check".
pub const FORCE_CHECK_KEYWORDS: &[&str] = &[
    "检查系统",
    "系统检查",
    "巡检",
    "全面检查",
    "健康检查",
    "状态检查",
];

/// Greetings and small talk. ASCII entries only match whole words.
pub const CHAT_KEYWORDS: &[&str] = &["你好", "hello", "hi", "谢谢", "再见", "帮助", "介绍"];

pub fn category_patterns(intent: IntentType) -> &'static [&'static str] {
    match intent {
        IntentType::SystemCheck => &[
            "检查系统",
            "系统检查",
            "巡检",
            "健康检查",
            "状态检查",
            "体检",
            "诊断",
            "全面检查",
            "监控检查",
            r"全面.*检查",
        ],
        IntentType::Chat => &[
            "你好", "谢谢", "再见", "帮助", "介绍", "什么是", "如何", "为什么", "解释", "聊天",
            "对话", "交流",
        ],
        IntentType::SystemInfo => &[
            r".*cpu.*(?:使用率|情况|状态|是多少|怎么样)",
            r".*内存.*(?:使用率|情况|状态|是多少|怎么样)",
            r".*磁盘.*(?:使用率|情况|状态|空间)",
            r".*网络.*(?:状态|情况)",
            r".*负载.*(?:情况|状态)",
            r".*进程.*(?:情况|状态)",
            r"当前.*状态",
            r"显示.*信息",
            r"查看.*(?:cpu|内存|磁盘|网络)",
            r"获取.*(?:cpu|内存|磁盘|网络|指标|数据)",
            "cpu使用率",
            "内存使用率",
            "磁盘使用率",
            "网络状态",
            r"cpu.*是多少",
            r"内存.*是多少",
            r"磁盘.*是多少",
            r"网络.*怎么样",
        ],
        IntentType::Troubleshoot => &[
            "故障",
            "问题",
            "错误",
            "异常",
            "失败",
            "不能",
            "无法",
            "解决",
            "修复",
            "排查",
            r"诊断.*问题",
        ],
        IntentType::CommandExec => &[
            "执行", "运行", "启动", "停止", "重启", "删除", "创建", "修改", "命令", "操作",
        ],
        IntentType::Performance => &[
            "性能",
            "优化",
            "慢",
            "卡顿",
            "延迟",
            "速度",
            "效率",
            "瓶颈",
            "压力测试",
            "负载测试",
        ],
        IntentType::Optimization => &[
            "优化", "清理", "加速", "提升", "改进", "配置", "调优", "参数", "设置",
        ],
    }
}

/// (keyword, canonical resource type, display name); first hit wins.
pub const RESOURCE_KEYWORDS: &[(&str, &str, &str)] = &[
    ("cpu", "cpu", "CPU使用率"),
    ("memory", "memory", "内存使用情况"),
    ("内存", "memory", "内存使用情况"),
    ("磁盘", "disk", "磁盘使用情况"),
    ("disk", "disk", "磁盘使用情况"),
    ("网络", "network", "网络状态"),
    ("network", "network", "网络状态"),
    ("进程", "process", "进程信息"),
    ("process", "process", "进程信息"),
    ("负载", "load", "系统负载"),
    ("load", "load", "系统负载"),
];

/// "label: description" forms; capture group 3 is the description.
pub const PROBLEM_PATTERNS: &[&str] = &[
    r"(错误|异常|失败)([:：]\s*)(.+)",
    r"(问题|故障)([:：]\s*)(.+)",
    r"(不能|无法|失败)([:：]\s*)(.+)",
];

pub const ACTION_KEYWORDS: &[&str] = &["启动", "停止", "重启", "删除", "创建", "执行", "运行"];

/// Patterns without any regex metacharacter score as exact text.
pub fn is_plain_text(pattern: &str) -> bool {
    !pattern.chars().any(|c| r"*.+?[](){}\".contains(c))
}
