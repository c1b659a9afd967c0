//! 平台能力探测：启动时确定一次写入模型（旧式直接写文件 / 新式媒体库两阶段提交）
//! 以及所需的权限，之后不再在调用时分支。

use serde::{Deserialize, Serialize};

/// Android 10（API 29）起改用分区存储。
pub const ANDROID_SCOPED_STORAGE_API: u32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetOs {
    Android,
    Ios,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityLevel {
    /// 直接写入公共图片目录下的相册文件夹
    Legacy,
    /// 先插入 pending 条目，写完字节后再提交
    Scoped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionRequirement {
    None,
    /// 旧式存储写权限（WRITE_EXTERNAL_STORAGE）
    LegacyStorageWrite,
    /// 照片库“仅添加”权限
    PhotoLibraryAdd,
}

impl PermissionRequirement {
    /// 被拒绝时返回给调用方的提示
    pub fn denied_message(&self) -> &'static str {
        match self {
            PermissionRequirement::LegacyStorageWrite | PermissionRequirement::None => {
                "Storage permission denied"
            }
            PermissionRequirement::PhotoLibraryAdd => "Photo library add permission denied",
        }
    }
}

/// 平台描述。`api_level` 对 Android 为 SDK_INT，其余平台忽略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
    pub os: TargetOs,
    #[serde(default)]
    pub api_level: u32,
}

impl PlatformProfile {
    pub fn android(api_level: u32) -> Self {
        Self {
            os: TargetOs::Android,
            api_level,
        }
    }

    pub fn ios() -> Self {
        Self {
            os: TargetOs::Ios,
            api_level: 0,
        }
    }

    pub fn desktop() -> Self {
        Self {
            os: TargetOs::Desktop,
            api_level: 0,
        }
    }

    /// 按编译目标推断。Android 的 API level 编译期拿不到，由宿主在 setup 时覆盖。
    pub fn probe() -> Self {
        if cfg!(target_os = "android") {
            Self::android(ANDROID_SCOPED_STORAGE_API)
        } else if cfg!(target_os = "ios") {
            Self::ios()
        } else {
            Self::desktop()
        }
    }

    pub fn capability(&self) -> CapabilityLevel {
        match self.os {
            TargetOs::Android if self.api_level < ANDROID_SCOPED_STORAGE_API => {
                CapabilityLevel::Legacy
            }
            TargetOs::Android | TargetOs::Ios => CapabilityLevel::Scoped,
            TargetOs::Desktop => CapabilityLevel::Legacy,
        }
    }

    pub fn permission(&self) -> PermissionRequirement {
        match self.os {
            TargetOs::Android if self.api_level < ANDROID_SCOPED_STORAGE_API => {
                PermissionRequirement::LegacyStorageWrite
            }
            TargetOs::Android => PermissionRequirement::None,
            TargetOs::Ios => PermissionRequirement::PhotoLibraryAdd,
            TargetOs::Desktop => PermissionRequirement::None,
        }
    }
}
