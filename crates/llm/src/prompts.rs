//! Fixed system prompts for every LLM job in the pipeline.
//!
//! The extraction and compression prompts are Russian because both the
//! source texts and the user requests are Russian; the grounded-answer
//! prompt follows the instruction format the target model was tuned on.

/// Preference extraction: turn a free-form request into labeled sections.
/// Downstream stages probe this text with regex/substring checks, so the
/// section labels are part of the contract.
pub const SYSTEM_PROMPT: &str = "Ты — помощник по анализу туристических предпочтений. \
Выдели из запроса пользователя ключевые предпочтения и оформи их по разделам:
- Тип местности: (море, горы, санаторий, город — если указано)
- Погода: (желаемая температура, климат)
- Даты: (месяц, сезон поездки)
- Бюджет: (если указан)
- Дополнительно: (особые пожелания)
Пиши кратко, только факты из запроса. Если раздел не упомянут, пропусти его.";

/// Grounded RAG answering over the supplied document set.
pub const GROUNDED_SYSTEM_PROMPT: &str = "Your task is to answer the user's questions \
using only the information from the provided documents. Cite the relevant cities by \
name. If the documents do not contain the answer, say so. Answer in Russian.";

/// Chunk compression: shrink a text while keeping tourist-relevant facts.
pub const COMPRESS_PROMPT: &str = "Кратко обобщите ключевую туристическую информацию, включая:
- климат и погодные условия
- экологическую обстановку
- температуру воды (если есть водоемы)
- основные достопримечательности
- исторические объекты
- транспортную доступность
Сохраняйте только самую важную информацию для туристов.";

/// Merge per-chunk summaries into one coherent city description.
pub const MERGE_PROMPT: &str = "Объедините информацию в связное описание места, фокусируясь на:
- главных достопримечательностях
- климате и сезонности посещения
- транспортной инфраструктуре
- уникальных особенностях места
- практических советах для туристов
Информация должна быть полезной для планирования поездки.";

/// Constrained activity classification. The model must answer with one
/// identifier from the fixed list, or "none".
pub const ACTIVITY_PROMPT: &str = "Определи основной вид отдыха из запроса пользователя. \
Ответь ровно одним словом из списка:
winter_sports, beach_vacation, cultural_tourism, family_vacation, spa_wellness, none";

/// Constrained season classification.
pub const SEASON_PROMPT: &str = "Определи сезон поездки из текста. \
Ответь ровно одним словом из списка: winter, spring, summer, fall, none";
