use super::operator::MULTARY_OPERATOR_MAPPING;
use super::operator::UNARY_OPERATOR_MAPPING;
use super::Parser;
use crate::ast::expr::BinaryExpr;
use crate::ast::expr::CallExpr;
use crate::ast::expr::ComputedMemberExpr;
use crate::ast::expr::CondExpr;
use crate::ast::expr::Expr;
use crate::ast::expr::FuncExpr;
use crate::ast::expr::IdExpr;
use crate::ast::expr::LitArrExpr;
use crate::ast::expr::LitBoolExpr;
use crate::ast::expr::LitNullExpr;
use crate::ast::expr::LitObjExpr;
use crate::ast::expr::LitObjMember;
use crate::ast::expr::MemberExpr;
use crate::ast::expr::UnaryExpr;
use crate::ast::expr::UnaryPostfixExpr;
use crate::ast::node::Node;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::KEYWORDS_MAPPING;
use crate::operator::Associativity;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;
use crate::token::TT;

pub struct Asi {
  pub can_end_with_asi: bool,
  pub did_end_with_asi: bool,
}

impl Asi {
  pub fn can() -> Asi {
    Asi {
      can_end_with_asi: true,
      did_end_with_asi: false,
    }
  }

  pub fn no() -> Asi {
    Asi {
      can_end_with_asi: false,
      did_end_with_asi: false,
    }
  }
}

impl<'a> Parser<'a> {
  pub fn call_args(&mut self) -> SyntaxResult<Vec<Node<Expr>>> {
    let mut args = Vec::new();
    while self.peek().typ != TT::ParenthesisClose {
      let arg = self.expr([TT::Comma, TT::ParenthesisClose])?;
      args.push(arg);
      if !self.consume_if(TT::Comma).is_match() {
        break;
      };
    }
    Ok(args)
  }

  pub fn expr<const N: usize>(&mut self, terminators: [TT; N]) -> SyntaxResult<Node<Expr>> {
    self.expr_with_min_prec(1, terminators, &mut Asi::no())
  }

  pub fn expr_with_asi<const N: usize>(
    &mut self,
    terminators: [TT; N],
    asi: &mut Asi,
  ) -> SyntaxResult<Node<Expr>> {
    self.expr_with_min_prec(1, terminators, asi)
  }

  /// Parses a parenthesised expression like `(a + b)`.
  pub fn grouping(&mut self) -> SyntaxResult<Node<Expr>> {
    self.require(TT::ParenthesisOpen)?;
    let expr = self.expr_with_min_prec(1, [TT::ParenthesisClose], &mut Asi::no())?;
    self.require(TT::ParenthesisClose)?;
    Ok(expr)
  }

  pub fn func_expr(&mut self) -> SyntaxResult<Node<FuncExpr>> {
    self.with_loc(|p| {
      p.require(TT::KeywordFunction)?;
      let name = (p.peek().typ == TT::Identifier).then(|| p.consume_as_string());
      let func = p.func_common()?;
      Ok(FuncExpr { name, func })
    })
  }

  pub fn id_expr(&mut self) -> SyntaxResult<Node<IdExpr>> {
    self.with_loc(|p| {
      let name = p.id_name()?;
      Ok(IdExpr { name })
    })
  }

  /// Parses a raw identifier name as a string. To parse an IdExpr, use
  /// `id_expr`.
  pub fn id_name(&mut self) -> SyntaxResult<String> {
    let t = self.require_predicate(|typ| typ == TT::Identifier, "identifier")?;
    Ok(self.string(t.loc))
  }

  pub fn lit_arr(&mut self) -> SyntaxResult<Node<LitArrExpr>> {
    self.with_loc(|p| {
      p.require(TT::BracketOpen)?;
      let mut elements = Vec::new();
      while p.peek().typ != TT::BracketClose {
        elements.push(p.expr([TT::Comma, TT::BracketClose])?);
        if !p.consume_if(TT::Comma).is_match() {
          break;
        };
      }
      p.require(TT::BracketClose)?;
      Ok(LitArrExpr { elements })
    })
  }

  pub fn lit_obj(&mut self) -> SyntaxResult<Node<LitObjExpr>> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let mut members = Vec::new();
      while p.peek().typ != TT::BraceClose {
        let member = p.with_loc(|p| {
          let t = p.peek();
          let key = match t.typ {
            TT::Identifier | TT::LiteralNumber => p.consume_as_string(),
            TT::LiteralString => p.lit_str()?.stx.value,
            t if KEYWORDS_MAPPING.contains_key(&t) => p.consume_as_string(),
            _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("object member key"))),
          };
          p.require(TT::Colon)?;
          let value = p.expr([TT::Comma, TT::BraceClose])?;
          Ok(LitObjMember { key, value })
        })?;
        members.push(member);
        if !p.consume_if(TT::Comma).is_match() {
          break;
        };
      }
      p.require(TT::BraceClose)?;
      Ok(LitObjExpr { members })
    })
  }

  fn expr_operand<const N: usize>(
    &mut self,
    terminators: [TT; N],
    asi: &mut Asi,
  ) -> SyntaxResult<Node<Expr>> {
    let t0 = self.peek();
    // Handle unary operators before the operand.
    if let Some(operator) = UNARY_OPERATOR_MAPPING.get(&t0.typ) {
      return Ok(
        self
          .with_loc(|p| {
            p.consume();
            let next_min_prec =
              operator.precedence + (operator.associativity == Associativity::Left) as u8;
            let operand = p.expr_with_min_prec(next_min_prec, terminators, asi)?;
            Ok(UnaryExpr {
              operator: operator.name,
              argument: operand,
            })
          })?
          .into_wrapped(),
      );
    };

    #[rustfmt::skip]
    let expr: Node<Expr> = match t0.typ {
      TT::Identifier => self.id_expr()?.into_wrapped(),
      TT::BracketOpen => self.lit_arr()?.into_wrapped(),
      TT::BraceOpen => self.lit_obj()?.into_wrapped(),
      TT::KeywordFunction => self.func_expr()?.into_wrapped(),
      TT::LiteralTrue | TT::LiteralFalse => {
        let t = self.consume();
        Node::new(t.loc, LitBoolExpr { value: t.typ == TT::LiteralTrue }).into_wrapped()
      }
      TT::LiteralNull => {
        let t = self.consume();
        Node::new(t.loc, LitNullExpr {}).into_wrapped()
      }
      TT::LiteralNumber => self.lit_num()?.into_wrapped(),
      TT::LiteralString => self.lit_str()?.into_wrapped(),
      TT::ParenthesisOpen => self.grouping()?,
      TT::EOF => return Err(t0.error(SyntaxErrorType::UnexpectedEnd)),
      TT::Invalid => return Err(t0.error(SyntaxErrorType::UnrecognizedToken)),
      _ => return Err(t0.error(SyntaxErrorType::ExpectedSyntax("expression operand"))),
    };
    Ok(expr)
  }

  pub fn expr_with_min_prec<const N: usize>(
    &mut self,
    min_prec: u8,
    terminators: [TT; N],
    asi: &mut Asi,
  ) -> SyntaxResult<Node<Expr>> {
    let mut left = self.expr_operand(terminators, asi)?;

    loop {
      let cp = self.checkpoint();
      let t = self.consume();

      if terminators.contains(&t.typ) {
        self.restore_checkpoint(cp);
        break;
      };

      match t.typ {
        // Automatic Semicolon Insertion rules: no newline between operand and
        // postfix operator.
        TT::PlusPlus | TT::HyphenHyphen if !t.preceded_by_line_terminator => {
          let operator_name = match t.typ {
            TT::PlusPlus => OperatorName::PostfixIncrement,
            TT::HyphenHyphen => OperatorName::PostfixDecrement,
            _ => unreachable!(),
          };
          let operator = &OPERATORS[&operator_name];
          if operator.precedence < min_prec {
            self.restore_checkpoint(cp);
            break;
          };
          left = Node::new(left.loc + t.loc, UnaryPostfixExpr {
            operator: operator_name,
            argument: left,
          })
          .into_wrapped();
          continue;
        }
        _ => {}
      };

      match MULTARY_OPERATOR_MAPPING.get(&t.typ) {
        None => {
          if asi.can_end_with_asi
            && (t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF)
          {
            // Automatic Semicolon Insertion.
            self.restore_checkpoint(cp);
            asi.did_end_with_asi = true;
            break;
          };
          return Err(t.error(SyntaxErrorType::ExpectedSyntax("expression operator")));
        }
        Some(operator) => {
          if operator.precedence < min_prec {
            self.restore_checkpoint(cp);
            break;
          };

          let next_min_prec =
            operator.precedence + (operator.associativity == Associativity::Left) as u8;

          left = match operator.name {
            OperatorName::Call => {
              let arguments = self.call_args()?;
              let end = self.require(TT::ParenthesisClose)?;
              Node::new(left.loc + end.loc, CallExpr {
                arguments,
                callee: left,
              })
              .into_wrapped()
            }
            OperatorName::ComputedMemberAccess => {
              let member = self.expr([TT::BracketClose])?;
              let end = self.require(TT::BracketClose)?;
              Node::new(left.loc + end.loc, ComputedMemberExpr {
                object: left,
                member,
              })
              .into_wrapped()
            }
            OperatorName::Conditional => {
              let consequent = self.expr([TT::Colon])?;
              self.require(TT::Colon)?;
              let alternate = self.expr_with_min_prec(
                OPERATORS[&OperatorName::ConditionalAlternate].precedence,
                terminators,
                asi,
              )?;
              Node::new(left.loc + alternate.loc, CondExpr {
                test: left,
                consequent,
                alternate,
              })
              .into_wrapped()
            }
            OperatorName::MemberAccess => {
              let right_tok = self.require_predicate(
                |typ| typ == TT::Identifier || KEYWORDS_MAPPING.contains_key(&typ),
                "member access property",
              )?;
              let right = right_tok.loc;
              Node::new(left.loc + right, MemberExpr {
                left,
                right: self.string(right),
              })
              .into_wrapped()
            }
            _ => {
              let right = self.expr_with_min_prec(next_min_prec, terminators, asi)?;
              Node::new(left.loc + right.loc, BinaryExpr {
                operator: operator.name,
                left,
                right,
              })
              .into_wrapped()
            }
          };
        }
      };
    }

    Ok(left)
  }
}
