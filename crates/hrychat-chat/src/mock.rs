//! Canned-response provider for UI development and tests.
//!
//! Responses are picked round-robin per provider instance and streamed
//! word by word with a small random delay to imitate a typing model.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::providers::{FragmentEvent, FragmentStream};

/// Default per-fragment delay range in milliseconds.
pub const DEFAULT_DELAY_MS: RangeInclusive<u64> = 20..=80;

pub const MOCK_RESPONSES: &[&str] = &[
    r#"## 深入理解现代前端架构设计

感谢你的问题！让我详细为你解答关于现代前端架构的核心概念和最佳实践。

### 1. 架构概述

根据官方文档[^1]，现代前端架构主要由以下几个核心部分组成：

- **状态管理层**：负责应用数据的集中管理
- **视图层**：负责 UI 渲染和用户交互
- **服务层**：负责与后端 API 通信
- **路由层**：负责页面导航和权限控制

### 2. 状态管理详解

根据[[技术报告]]，状态管理是现代前端应用的核心。以下是一个典型的状态管理示例：

```typescript
// 使用 Jotai 进行状态管理
import { atom, useAtom } from 'jotai';

// 定义原子状态
export const userAtom = atom<User | null>(null);
export const themeAtom = atom<'light' | 'dark'>('light');

// 派生状态
export const isLoggedInAtom = atom((get) => {
  return get(userAtom) !== null;
});

```

### 3. 组件设计原则

根据最新研究[^2]，良好的组件设计应遵循以下原则：

1. **单一职责原则**：每个组件只负责一个功能
2. **可组合性**：组件应易于组合和复用
3. **可测试性**：组件应易于单元测试
4. **性能优化**：避免不必要的重渲染

> 💡 **最佳实践提示**：始终将业务逻辑与 UI 逻辑分离，使用 Custom Hooks 封装可复用的逻辑。

### 4. 性能优化策略

根据[[最新研究]]的建议，以下是关键的性能优化策略：

| 优化策略 | 效果 | 适用场景 |
|---------|------|---------|
| 代码分割 | 减少首屏加载时间 | 大型应用 |
| 虚拟列表 | 处理大量数据 | 长列表页面 |
| 图片懒加载 | 减少带宽消耗 | 图片密集页面 |
| Memo 化 | 避免重复计算 | 复杂计算场景 |

### 5. 总结

综上所述[^3]，构建一个优秀的前端架构需要综合考虑：

- 清晰的代码组织结构
- 合理的状态管理方案
- 完善的性能优化策略
- 良好的开发体验

希望这个回答对你有帮助！如果有任何疑问，欢迎继续讨论。
"#,
    r#"## 全栈开发最佳实践指南

非常好的问题！让我从多个角度为你分析全栈开发的关键要点。

### 1. 后端架构设计

根据官方文档[^1]，一个健壮的后端架构应该包含以下层次：

**服务层架构**：
- API 网关层：负责请求路由和认证
- 业务逻辑层：核心业务处理
- 数据访问层：数据库操作封装
- 缓存层：提升读取性能

```python
# FastAPI 服务示例
from fastapi import FastAPI, Depends, HTTPException
from sqlalchemy.orm import Session

app = FastAPI()

```

### 2. 数据库设计原则

根据[[技术报告]]，数据库设计需要注意以下几点：

1. **规范化**：减少数据冗余
2. **索引优化**：提升查询性能
3. **分表策略**：处理大数据量
4. **读写分离**：提升并发能力

> ⚠️ **注意**：过度规范化可能导致查询复杂度增加，需要根据实际场景权衡。

### 3. API 设计规范

根据性能优化指南[^2]，RESTful API 设计应遵循：

| HTTP 方法 | 用途 | 示例 |
|----------|------|------|
| GET | 查询资源 | `GET /users/{id}` |
| POST | 创建资源 | `POST /users` |
| PUT | 更新资源 | `PUT /users/{id}` |
| DELETE | 删除资源 | `DELETE /users/{id}` |

### 4. 安全性考虑

根据[[最新研究]]，安全性是全栈开发的重中之重：

- **认证机制**：JWT Token、OAuth 2.0
- **授权控制**：RBAC 权限模型
- **数据加密**：HTTPS、敏感数据加密存储
- **输入验证**：防止 SQL 注入、XSS 攻击

```typescript
// JWT 认证中间件示例
import jwt from 'jsonwebtoken';

export function authMiddleware(req, res, next) {
  const token = req.headers.authorization?.split(' ')[1];

  if (!token) {
    return res.status(401).json({ error: 'No token provided' });
  }

  try {
    const decoded = jwt.verify(token, process.env.JWT_SECRET);
    req.user = decoded;
    next();
  } catch (error) {
    return res.status(403).json({ error: 'Invalid token' });
  }
}
```

### 5. 部署与运维

最后[^3]，关于部署和运维的建议：

- 使用 Docker 容器化部署
- 配置 CI/CD 自动化流程
- 建立监控和告警系统
- 定期进行性能测试和安全审计

希望这些内容能够帮助你构建更好的全栈应用！
"#,
];

/// Round-robin canned-response provider.
///
/// The rotation index belongs to the instance: share one instance to get
/// process-wide rotation, or build one per request to always start at 0.
#[derive(Debug)]
pub struct MockProvider {
    responses: Arc<[String]>,
    next_index: AtomicUsize,
    delay_ms: RangeInclusive<u64>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_responses(MOCK_RESPONSES.iter().map(|s| s.to_string()).collect())
    }

    /// Use a custom response pool. An empty pool streams nothing.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: responses.into(),
            next_index: AtomicUsize::new(0),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }

    /// Override the delay between words. `0..=0` disables it.
    pub fn with_delay(mut self, delay_ms: RangeInclusive<u64>) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn pool_size(&self) -> usize {
        self.responses.len()
    }

    /// Pick the next response and stream it as word/separator fragments.
    pub fn stream(&self) -> FragmentStream {
        let response = if self.responses.is_empty() {
            String::new()
        } else {
            let index = self.next_index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
            debug!("Mock provider selected response {}", index);
            self.responses[index].clone()
        };
        let delay_ms = self.delay_ms.clone();

        Box::pin(async_stream::stream! {
            let fragments = split_fragments(&response);
            let last = fragments.len().saturating_sub(1);
            for (i, fragment) in fragments.into_iter().enumerate() {
                yield FragmentEvent::Text(fragment.to_string());
                // Pause after words only, and not after the final one
                if fragment == SEPARATOR || i == last {
                    continue;
                }
                let ms = pick_delay(&delay_ms);
                if ms > 0 {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                }
            }
            yield FragmentEvent::Done;
        })
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_delay(range: &RangeInclusive<u64>) -> u64 {
    if range.start() >= range.end() {
        *range.start()
    } else {
        rand::thread_rng().gen_range(range.clone())
    }
}

const SEPARATOR: &str = " ";

/// Split on single spaces, emitting a `" "` separator before every word but
/// the first. Empty words from repeated spaces are dropped; their separators
/// are kept so the fragments concatenate back to `text` exactly.
pub fn split_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            fragments.push(SEPARATOR);
        }
        if !word.is_empty() {
            fragments.push(word);
        }
    }
    fragments
}
