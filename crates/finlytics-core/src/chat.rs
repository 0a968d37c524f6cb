//! Rule-based financial assistant
//!
//! Keyword matching over free-text input, answering from aggregates computed
//! by [`crate::aggregate`]. The rule table is ordered and evaluated top-down;
//! the first matching rule wins, with a generic fallback at the end, so the
//! output is deterministic for a given (input, aggregates) pair.

use chrono::NaiveDate;

use crate::aggregate;
use crate::models::{Transaction, TransactionKind};

/// Aggregate snapshot the responder answers from
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub transaction_count: i64,
    /// Top expense category by total, if any expense exists
    pub top_expense_category: Option<(String, f64)>,
}

impl ChatContext {
    /// Build the context from an owner's full transaction list via the
    /// aggregation engine.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let totals = aggregate::period_totals(transactions, NaiveDate::MIN, NaiveDate::MAX);
        let ratios = aggregate::health_ratios(transactions);
        let top = aggregate::category_breakdown(transactions, TransactionKind::Expense, Some(1))
            .into_iter()
            .next()
            .map(|c| (c.category, c.total));

        Self {
            income: totals.income,
            expense: totals.expense,
            net: totals.net,
            transaction_count: ratios.transaction_count,
            top_expense_category: top,
        }
    }
}

/// One (trigger, response) pair. `matches` sees the lowercased input.
struct Rule {
    matches: fn(&str, &ChatContext) -> bool,
    respond: fn(&ChatContext) -> String,
}

const TIPS: &[&str] = &[
    "Registre todas as suas transações para ter controle total.",
    "Defina metas mensais de gastos por categoria.",
    "Sempre reserve uma parte da renda para emergências.",
    "Revise seus gastos mensalmente para identificar padrões.",
    "Considere automatizar suas economias.",
];

// Rule order is significant: first match wins. The empty-store rule sits
// after the keyword rules so "qual meu saldo?" is still answered with the
// balance template even with zero transactions.
const RULES: &[Rule] = &[
    Rule {
        matches: |input, _| input.contains("saldo") || input.contains("balanço"),
        respond: |ctx| {
            format!(
                "Seu saldo atual é de {}. Você tem {} em receitas e {} em despesas registradas.",
                format_brl(ctx.net),
                format_brl(ctx.income),
                format_brl(ctx.expense),
            )
        },
    },
    Rule {
        matches: |input, _| input.contains("receita") || input.contains("ganho"),
        respond: |ctx| {
            let remark = if ctx.income > ctx.expense {
                "Parabéns! Você está gastando menos do que ganha."
            } else {
                "Atenção: suas despesas estão maiores que suas receitas."
            };
            format!(
                "Suas receitas totais são de {}. {}",
                format_brl(ctx.income),
                remark
            )
        },
    },
    Rule {
        matches: |input, _| input.contains("despesa") || input.contains("gasto"),
        respond: |ctx| {
            let remark = if ctx.expense > ctx.income {
                "Recomendo revisar seus gastos para equilibrar o orçamento."
            } else {
                "Seus gastos estão controlados!"
            };
            format!(
                "Suas despesas totais são de {}. {}",
                format_brl(ctx.expense),
                remark
            )
        },
    },
    Rule {
        matches: |input, _| input.contains("dica") || input.contains("conselho"),
        // The tip index derives from the transaction count so the reply is a
        // pure function of (input, aggregates).
        respond: |ctx| TIPS[ctx.transaction_count.unsigned_abs() as usize % TIPS.len()].to_string(),
    },
    Rule {
        matches: |input, ctx| input.contains("categoria") && ctx.top_expense_category.is_some(),
        respond: |ctx| {
            let (name, total) = ctx
                .top_expense_category
                .as_ref()
                .expect("guarded by matches");
            format!(
                "Sua categoria com mais gastos é \"{}\" com {}.",
                name,
                format_brl(*total)
            )
        },
    },
    Rule {
        matches: |_, ctx| ctx.transaction_count == 0,
        respond: |_| {
            "Você ainda não tem transações registradas. Comece adicionando suas receitas e \
             despesas para que eu possa ajudá-lo melhor!"
                .to_string()
        },
    },
];

/// Answer free-text input from the current aggregates. Falls back to a
/// generic summary when no rule matches.
pub fn respond(input: &str, ctx: &ChatContext) -> String {
    let lowered = input.to_lowercase();

    for rule in RULES {
        if (rule.matches)(&lowered, ctx) {
            return (rule.respond)(ctx);
        }
    }

    format!(
        "Você tem {} transações registradas. Seu saldo atual é {}. Posso ajudá-lo com \
         análises específicas, dicas de economia ou planejamento financeiro. O que gostaria \
         de saber?",
        ctx.transaction_count,
        format_brl(ctx.net),
    )
}

/// Opening message shown before the user says anything
pub fn greeting() -> &'static str {
    "Olá! Sou seu assistente financeiro. Posso ajudá-lo a analisar suas transações, criar \
     orçamentos e dar dicas para melhorar sua saúde financeira. Como posso ajudá-lo hoje?"
}

/// Canned question suggestions for the chat UI
pub fn suggested_questions() -> &'static [&'static str] {
    &[
        "Qual é meu saldo atual?",
        "Quanto gastei este mês?",
        "Qual categoria tem mais gastos?",
        "Me dê uma dica de economia",
        "Como posso melhorar minhas finanças?",
        "Minhas receitas estão boas?",
    ]
}

/// Format an amount as Brazilian currency ("R$ 1.234,56").
pub fn format_brl(amount: f64) -> String {
    let cents = if amount.is_finite() {
        (amount * 100.0).round() as i64
    } else {
        0
    };
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let reais = cents / 100;
    let frac = cents % 100;

    // Group the integer part in threes with '.' separators.
    let digits = reais.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{:02}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ChatContext {
        ChatContext {
            income: 5000.0,
            expense: 150.50,
            net: 4849.50,
            transaction_count: 2,
            top_expense_category: Some(("Alimentação".to_string(), 150.50)),
        }
    }

    #[test]
    fn formats_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(150.5), "R$ 150,50");
        assert_eq!(format_brl(4849.5), "R$ 4.849,50");
        assert_eq!(format_brl(1234567.89), "R$ 1.234.567,89");
        assert_eq!(format_brl(-200.0), "-R$ 200,00");
        assert_eq!(format_brl(f64::NAN), "R$ 0,00");
    }

    #[test]
    fn balance_question_answers_with_totals() {
        let reply = respond("Qual é meu saldo atual?", &ctx());
        assert!(reply.contains("R$ 4.849,50"));
        assert!(reply.contains("R$ 5.000,00"));
        assert!(reply.contains("R$ 150,50"));
    }

    #[test]
    fn first_match_wins_over_later_rules() {
        // Mentions both "saldo" and "despesa"; the balance rule is first.
        let reply = respond("meu saldo e minhas despesas", &ctx());
        assert!(reply.starts_with("Seu saldo atual"));
    }

    #[test]
    fn category_question_names_top_expense() {
        let reply = respond("Qual categoria tem mais gastos?", &ctx());
        // "gastos" also matches the expense rule, which comes first in the
        // table; category must only win when the expense keyword is absent.
        assert!(reply.starts_with("Suas despesas totais"));

        let reply = respond("qual a maior categoria?", &ctx());
        assert!(reply.contains("Alimentação"));
        assert!(reply.contains("R$ 150,50"));
    }

    #[test]
    fn tip_is_deterministic_for_same_aggregates() {
        let a = respond("me dê uma dica", &ctx());
        let b = respond("me dê uma dica", &ctx());
        assert_eq!(a, b);
        assert_eq!(a, TIPS[2]);
    }

    #[test]
    fn empty_store_prompts_for_first_transaction() {
        let empty = ChatContext::default();
        let reply = respond("como melhorar minhas finanças?", &empty);
        assert!(reply.contains("ainda não tem transações"));

        // Keyword rules still win over the empty-store rule.
        let reply = respond("qual meu saldo?", &empty);
        assert!(reply.starts_with("Seu saldo atual"));
    }

    #[test]
    fn fallback_summarizes() {
        let reply = respond("bom dia!", &ctx());
        assert!(reply.contains("2 transações"));
        assert!(reply.contains("R$ 4.849,50"));
    }
}
